//! Permission composition.
//!
//! A [`PermissionSpec`] is the unevaluated form a view declares: leaves are
//! factories, inner nodes are `And`/`Or`/`Not`. Instantiating a spec builds
//! every leaf and yields a [`CompositePermission`] with the same shape, which
//! is then evaluated by structural recursion.
//!
//! Only types implementing [`Permission`] can become leaves, so a malformed
//! composition is rejected when it is written rather than when it runs.

use crate::error::PermissionResult;
use crate::permission::Permission;
use crate::view::{Request, View};
use std::any::Any;
use std::sync::Arc;
use warrant_core::Q;

type Factory = Arc<dyn Fn() -> Box<dyn Permission> + Send + Sync>;

/// A permission declaration, instantiated per request
#[derive(Clone)]
pub enum PermissionSpec {
    /// Builds one leaf permission
    Leaf(Factory),
    /// Both operands must allow
    And(Box<PermissionSpec>, Box<PermissionSpec>),
    /// Either operand may allow
    Or(Box<PermissionSpec>, Box<PermissionSpec>),
    /// Inverts the operand
    Not(Box<PermissionSpec>),
}

impl PermissionSpec {
    /// Leaf built with `P::default()`
    #[must_use]
    pub fn leaf<P: Permission + Default + 'static>() -> Self {
        Self::Leaf(Arc::new(|| Box::new(P::default()) as Box<dyn Permission>))
    }

    /// Leaf built by a closure, for permissions that need arguments
    #[must_use]
    pub fn from_fn<P, F>(factory: F) -> Self
    where
        P: Permission + 'static,
        F: Fn() -> P + Send + Sync + 'static,
    {
        Self::Leaf(Arc::new(move || Box::new(factory()) as Box<dyn Permission>))
    }

    /// `self AND other`
    #[must_use]
    pub fn and(self, other: PermissionSpec) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// `self OR other`
    #[must_use]
    pub fn or(self, other: PermissionSpec) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// `NOT self`
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Build every leaf
    #[must_use]
    pub fn instantiate(&self) -> CompositePermission {
        match self {
            Self::Leaf(factory) => CompositePermission::Leaf(factory()),
            Self::And(left, right) => CompositePermission::And(
                Box::new(left.instantiate()),
                Box::new(right.instantiate()),
            ),
            Self::Or(left, right) => CompositePermission::Or(
                Box::new(left.instantiate()),
                Box::new(right.instantiate()),
            ),
            Self::Not(inner) => CompositePermission::Not(Box::new(inner.instantiate())),
        }
    }
}

impl std::fmt::Debug for PermissionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Leaf(_) => f.write_str("Leaf"),
            Self::And(left, right) => f.debug_tuple("And").field(left).field(right).finish(),
            Self::Or(left, right) => f.debug_tuple("Or").field(left).field(right).finish(),
            Self::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
        }
    }
}

/// Instantiated permission tree for one request
pub enum CompositePermission {
    /// One permission
    Leaf(Box<dyn Permission>),
    /// Boolean AND, filter AND
    And(Box<CompositePermission>, Box<CompositePermission>),
    /// Boolean OR, filter OR
    Or(Box<CompositePermission>, Box<CompositePermission>),
    /// Boolean NOT, filter NOT
    Not(Box<CompositePermission>),
}

impl CompositePermission {
    /// Request-level check
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a leaf that is evaluated.
    pub fn evaluate_permission(
        &self,
        request: &Request,
        view: &dyn View,
    ) -> PermissionResult<bool> {
        match self {
            Self::Leaf(permission) => permission.has_permission(request, view),
            Self::And(left, right) => Ok(left.evaluate_permission(request, view)?
                && right.evaluate_permission(request, view)?),
            Self::Or(left, right) => Ok(left.evaluate_permission(request, view)?
                || right.evaluate_permission(request, view)?),
            Self::Not(inner) => Ok(!inner.evaluate_permission(request, view)?),
        }
    }

    /// Object-level check
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a leaf that is evaluated.
    pub fn evaluate_object_permission(
        &self,
        request: &Request,
        view: &dyn View,
        obj: &dyn Any,
    ) -> PermissionResult<bool> {
        match self {
            Self::Leaf(permission) => permission.has_object_permission(request, view, obj),
            Self::And(left, right) => Ok(left.evaluate_object_permission(request, view, obj)?
                && right.evaluate_object_permission(request, view, obj)?),
            Self::Or(left, right) => Ok(left.evaluate_object_permission(request, view, obj)?
                || right.evaluate_object_permission(request, view, obj)?),
            Self::Not(inner) => Ok(!inner.evaluate_object_permission(request, view, obj)?),
        }
    }

    /// List filter
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a leaf.
    pub fn evaluate_filter(&self, request: &Request, view: &dyn View) -> PermissionResult<Q> {
        match self {
            Self::Leaf(permission) => permission.get_filter(request, view),
            Self::And(left, right) => {
                Ok(left.evaluate_filter(request, view)? & right.evaluate_filter(request, view)?)
            }
            Self::Or(left, right) => {
                Ok(left.evaluate_filter(request, view)? | right.evaluate_filter(request, view)?)
            }
            Self::Not(inner) => Ok(!inner.evaluate_filter(request, view)?),
        }
    }
}

impl Permission for CompositePermission {
    fn has_permission(&self, request: &Request, view: &dyn View) -> PermissionResult<bool> {
        self.evaluate_permission(request, view)
    }

    fn has_object_permission(
        &self,
        request: &Request,
        view: &dyn View,
        obj: &dyn Any,
    ) -> PermissionResult<bool> {
        self.evaluate_object_permission(request, view, obj)
    }

    fn get_filter(&self, request: &Request, view: &dyn View) -> PermissionResult<Q> {
        self.evaluate_filter(request, view)
    }
}

impl std::fmt::Debug for CompositePermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Leaf(_) => f.write_str("Leaf"),
            Self::And(left, right) => f.debug_tuple("And").field(left).field(right).finish(),
            Self::Or(left, right) => f.debug_tuple("Or").field(left).field(right).finish(),
            Self::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PermissionError;
    use http::Method;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use warrant_core::testing::TestUser;
    use warrant_policy::{Authorizer, ModelBackend, RequestUser};

    /// Leaf with fixed answers
    #[derive(Clone)]
    struct Fixed {
        allow: bool,
        allow_object: bool,
        filter: Q,
    }

    impl Permission for Fixed {
        fn has_permission(&self, _request: &Request, _view: &dyn View) -> PermissionResult<bool> {
            Ok(self.allow)
        }

        fn has_object_permission(
            &self,
            _request: &Request,
            _view: &dyn View,
            _obj: &dyn Any,
        ) -> PermissionResult<bool> {
            Ok(self.allow_object)
        }

        fn get_filter(&self, _request: &Request, _view: &dyn View) -> PermissionResult<Q> {
            Ok(self.filter.clone())
        }
    }

    #[derive(Default)]
    struct Base;

    impl Permission for Base {}

    struct Failing;

    impl Permission for Failing {
        fn has_permission(&self, request: &Request, _view: &dyn View) -> PermissionResult<bool> {
            Err(PermissionError::MethodNotAllowed {
                method: request.method().to_string(),
            })
        }
    }

    struct EmptyView;

    impl View for EmptyView {
        fn name(&self) -> &str {
            "empty"
        }

        fn permissions(&self) -> &[PermissionSpec] {
            &[]
        }
    }

    fn request() -> Request {
        let authorizer = Arc::new(Authorizer::builder().backend(ModelBackend::new()).build());
        Request::new(Method::GET, RequestUser::new(Arc::new(TestUser::new(1)), authorizer))
    }

    fn fixed(allow: bool, allow_object: bool, filter: Q) -> PermissionSpec {
        let leaf = Fixed {
            allow,
            allow_object,
            filter,
        };
        PermissionSpec::from_fn(move || leaf.clone())
    }

    fn filter_strategy() -> impl Strategy<Value = Q> {
        prop_oneof![
            Just(Q::all()),
            Just(Q::none()),
            (0i64..3).prop_map(|v| Q::exact("author", v)),
            any::<bool>().prop_map(|v| Q::exact("published", v)),
        ]
    }

    #[test]
    fn test_base_permission_defaults() {
        let permission = PermissionSpec::leaf::<Base>().instantiate();
        let req = request();
        assert!(permission.evaluate_permission(&req, &EmptyView).unwrap());
        assert!(permission.evaluate_object_permission(&req, &EmptyView, &()).unwrap());
        assert!(permission.evaluate_filter(&req, &EmptyView).unwrap().is_all());
    }

    #[test]
    fn test_instantiate_builds_every_leaf_each_time() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let leaf = PermissionSpec::from_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Base
        });
        let spec = leaf.clone().and(leaf.clone().or(leaf.negate()));

        spec.instantiate();
        assert_eq!(built.load(Ordering::SeqCst), 3);
        spec.instantiate();
        assert_eq!(built.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_nested_composition() {
        let req = request();
        let spec = fixed(true, true, Q::exact("author", 1))
            .and(fixed(false, false, Q::none()).negate())
            .or(fixed(false, false, Q::exact("published", true)));
        let permission = spec.instantiate();

        assert!(permission.evaluate_permission(&req, &EmptyView).unwrap());
        assert_eq!(
            permission.evaluate_filter(&req, &EmptyView).unwrap(),
            Q::exact("author", 1) | Q::exact("published", true)
        );
    }

    #[test]
    fn test_error_propagates() {
        let req = request();
        let permission = PermissionSpec::leaf::<Base>()
            .and(PermissionSpec::from_fn(|| Failing))
            .instantiate();
        assert!(matches!(
            permission.evaluate_permission(&req, &EmptyView),
            Err(PermissionError::MethodNotAllowed { .. })
        ));
    }

    #[test]
    fn test_composite_is_a_permission() {
        let req = request();
        let inner: Box<dyn Permission> = Box::new(fixed(false, true, Q::all()).instantiate());
        let outer = CompositePermission::Not(Box::new(CompositePermission::Leaf(inner)));
        assert!(outer.has_permission(&req, &EmptyView).unwrap());
        assert!(!outer.has_object_permission(&req, &EmptyView, &()).unwrap());
        assert!(outer.get_filter(&req, &EmptyView).unwrap().is_none());
    }

    proptest::proptest! {
        #[test]
        fn prop_and_or_not_laws(
            a in any::<bool>(),
            ao in any::<bool>(),
            fa in filter_strategy(),
            b in any::<bool>(),
            bo in any::<bool>(),
            fb in filter_strategy(),
        ) {
            let req = request();
            let view = EmptyView;
            let left = fixed(a, ao, fa.clone());
            let right = fixed(b, bo, fb.clone());

            let and = left.clone().and(right.clone()).instantiate();
            prop_assert_eq!(and.evaluate_permission(&req, &view).unwrap(), a && b);
            prop_assert_eq!(and.evaluate_object_permission(&req, &view, &()).unwrap(), ao && bo);
            prop_assert_eq!(and.evaluate_filter(&req, &view).unwrap(), fa.clone() & fb.clone());

            let or = left.clone().or(right).instantiate();
            prop_assert_eq!(or.evaluate_permission(&req, &view).unwrap(), a || b);
            prop_assert_eq!(or.evaluate_object_permission(&req, &view, &()).unwrap(), ao || bo);
            prop_assert_eq!(or.evaluate_filter(&req, &view).unwrap(), fa.clone() | fb);

            let not = left.negate().instantiate();
            prop_assert_eq!(not.evaluate_permission(&req, &view).unwrap(), !a);
            prop_assert_eq!(not.evaluate_object_permission(&req, &view, &()).unwrap(), !ao);
            prop_assert_eq!(not.evaluate_filter(&req, &view).unwrap(), !fa);
        }
    }
}

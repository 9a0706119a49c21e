//! Policies.
//!
//! A policy decides whether a user may act on one object of model `M` and
//! produces the filter narrowing a list of `M` to what the user may act on.
//! Both default to deny: a policy that does not override a method never grants
//! broader access than it spells out.

use std::any::Any;
use std::marker::PhantomData;
use warrant_core::{Model, ModelMeta, Q, User};

/// Object-level authorization for one model
pub trait Policy<M: Model>: Send + Sync + 'static {
    /// Whether `user` may act on `obj`; must be free of side effects
    fn has_perm(&self, _user: &dyn User, _obj: &M) -> bool {
        false
    }

    /// Rows of `M` the user may act on
    fn get_filter(&self, _user: &dyn User) -> Q {
        Q::none()
    }
}

/// Superuser-aware entry points, implemented for every policy
pub trait PolicyExt<M: Model>: Policy<M> {
    /// `true` for superusers, otherwise [`Policy::has_perm`]
    fn has_perm_final(&self, user: &dyn User, obj: &M) -> bool;

    /// `Q::all()` for superusers, otherwise [`Policy::get_filter`]
    fn get_filter_final(&self, user: &dyn User) -> Q;
}

impl<M: Model, P: Policy<M> + ?Sized> PolicyExt<M> for P {
    fn has_perm_final(&self, user: &dyn User, obj: &M) -> bool {
        if user.is_superuser() {
            return true;
        }
        self.has_perm(user, obj)
    }

    fn get_filter_final(&self, user: &dyn User) -> Q {
        if user.is_superuser() {
            return Q::all();
        }
        self.get_filter(user)
    }
}

/// A registered policy with its model type erased
pub trait ErasedPolicy: Send + Sync {
    /// Model the policy was registered for
    fn model(&self) -> &ModelMeta;

    /// Superuser-aware object check; objects of another model are denied
    fn has_perm_final(&self, user: &dyn User, obj: &dyn Any) -> bool;

    /// Superuser-aware filter
    fn get_filter_final(&self, user: &dyn User) -> Q;
}

pub(crate) struct BoundPolicy<M, P> {
    meta: ModelMeta,
    policy: P,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model, P: Policy<M>> BoundPolicy<M, P> {
    pub(crate) fn new(policy: P) -> Self {
        Self {
            meta: M::meta(),
            policy,
            _model: PhantomData,
        }
    }
}

impl<M: Model, P: Policy<M>> ErasedPolicy for BoundPolicy<M, P> {
    fn model(&self) -> &ModelMeta {
        &self.meta
    }

    fn has_perm_final(&self, user: &dyn User, obj: &dyn Any) -> bool {
        if user.is_superuser() {
            return true;
        }
        match obj.downcast_ref::<M>() {
            Some(obj) => self.policy.has_perm(user, obj),
            None => {
                tracing::warn!(model = %self.meta, "policy received an object of another model");
                false
            }
        }
    }

    fn get_filter_final(&self, user: &dyn User) -> Q {
        PolicyExt::get_filter_final(&self.policy, user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use warrant_core::UserId;
    use warrant_core::testing::{Blog, Post, TestUser};

    struct DefaultPolicy;

    impl Policy<Post> for DefaultPolicy {}

    struct AuthorPolicy;

    impl Policy<Post> for AuthorPolicy {
        fn has_perm(&self, user: &dyn User, obj: &Post) -> bool {
            user.id() == Some(obj.author)
        }

        fn get_filter(&self, user: &dyn User) -> Q {
            user.id().map_or(Q::none(), |id| Q::exact("author", id))
        }
    }

    struct FixedPolicy {
        allow: bool,
        filter: Q,
    }

    impl Policy<Post> for FixedPolicy {
        fn has_perm(&self, _user: &dyn User, _obj: &Post) -> bool {
            self.allow
        }

        fn get_filter(&self, _user: &dyn User) -> Q {
            self.filter.clone()
        }
    }

    fn post(author: i64) -> Post {
        Post {
            id: 1,
            author: UserId::new(author),
            blog: 10,
            published: false,
        }
    }

    #[test]
    fn test_default_policy_denies() {
        let user = TestUser::new(1);
        assert!(!DefaultPolicy.has_perm(&user, &post(1)));
        assert!(DefaultPolicy.get_filter(&user).is_none());
        assert!(!DefaultPolicy.has_perm_final(&user, &post(1)));
    }

    #[test]
    fn test_author_policy() {
        let author = TestUser::new(1);
        let other = TestUser::new(2);
        let admin = TestUser::new(3).superuser();

        assert!(AuthorPolicy.has_perm_final(&author, &post(1)));
        assert!(!AuthorPolicy.has_perm_final(&other, &post(1)));
        assert!(AuthorPolicy.has_perm_final(&admin, &post(1)));
        assert_eq!(AuthorPolicy.get_filter_final(&author), Q::exact("author", 1));
        assert!(AuthorPolicy.get_filter_final(&admin).is_all());
    }

    #[test]
    fn test_erased_policy_downcast() {
        let bound = BoundPolicy::<Post, _>::new(AuthorPolicy);
        let author = TestUser::new(1);
        assert_eq!(bound.model().to_string(), "blog.post");
        assert!(bound.has_perm_final(&author, &post(1)));

        let blog = Blog {
            id: 10,
            owner: UserId::new(1),
        };
        assert!(!bound.has_perm_final(&author, &blog));
        assert!(bound.has_perm_final(&TestUser::new(9).superuser(), &blog));
    }

    proptest::proptest! {
        #[test]
        fn prop_superuser_bypass(
            allow in any::<bool>(),
            author in 0i64..5,
            restrict in any::<bool>(),
        ) {
            let policy = FixedPolicy {
                allow,
                filter: if restrict { Q::none() } else { Q::exact("published", true) },
            };
            let admin = TestUser::new(99).superuser();
            prop_assert!(policy.has_perm_final(&admin, &post(author)));
            prop_assert!(policy.get_filter_final(&admin).is_all());
        }
    }
}

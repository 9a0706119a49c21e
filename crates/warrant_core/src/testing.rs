//! Fixture users and models for tests.

use crate::filter::Value;
use crate::id::UserId;
use crate::permission::{Model, ModelMeta, PermissionId};
use crate::queryset::Record;
use crate::user::User;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Configurable user; counts how often its permission tables are read
#[derive(Debug, Clone)]
pub struct TestUser {
    id: Option<UserId>,
    superuser: bool,
    active: bool,
    perms: BTreeSet<PermissionId>,
    group_perms: BTreeSet<PermissionId>,
    lookups: Arc<AtomicUsize>,
}

impl TestUser {
    /// Active, non-superuser account with no permissions
    #[must_use]
    pub fn new(pk: i64) -> Self {
        Self {
            id: Some(UserId::new(pk)),
            superuser: false,
            active: true,
            perms: BTreeSet::new(),
            group_perms: BTreeSet::new(),
            lookups: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Mark as superuser
    #[must_use]
    pub fn superuser(mut self) -> Self {
        self.superuser = true;
        self
    }

    /// Mark as inactive
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Grant a permission directly
    #[must_use]
    pub fn with_perm(mut self, perm: &str) -> Self {
        self.perms.insert(parse(perm));
        self
    }

    /// Grant a permission through a group
    #[must_use]
    pub fn with_group_perm(mut self, perm: &str) -> Self {
        self.group_perms.insert(parse(perm));
        self
    }

    /// How many times the permission tables were read
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

fn parse(perm: &str) -> PermissionId {
    PermissionId::parse(perm).expect("fixture permission must be valid")
}

impl User for TestUser {
    fn id(&self) -> Option<UserId> {
        self.id
    }

    fn is_superuser(&self) -> bool {
        self.superuser
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn user_permissions(&self) -> BTreeSet<PermissionId> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.perms.clone()
    }

    fn group_permissions(&self) -> BTreeSet<PermissionId> {
        self.group_perms.clone()
    }
}

/// Blog post fixture model (`blog.post`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Primary key
    pub id: i64,
    /// Author
    pub author: UserId,
    /// Owning blog
    pub blog: i64,
    /// Whether the post is public
    pub published: bool,
}

impl Model for Post {
    fn meta() -> ModelMeta {
        ModelMeta::new("blog", "post").expect("fixture label is valid")
    }
}

impl Record for Post {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" | "pk" => Some(Value::Int(self.id)),
            "author" => Some(self.author.into()),
            "blog" => Some(Value::Int(self.blog)),
            "published" => Some(Value::Bool(self.published)),
            _ => None,
        }
    }
}

/// Blog fixture model (`blog.blog`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blog {
    /// Primary key
    pub id: i64,
    /// Owner
    pub owner: UserId,
}

impl Model for Blog {
    fn meta() -> ModelMeta {
        ModelMeta::new("blog", "blog").expect("fixture label is valid")
    }
}

impl Record for Blog {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" | "pk" => Some(Value::Int(self.id)),
            "owner" => Some(self.owner.into()),
            _ => None,
        }
    }
}

/// Four posts: users 1 and 2 each own one published and one draft post
#[must_use]
pub fn fixture_posts() -> Vec<Post> {
    vec![
        Post {
            id: 1,
            author: UserId::new(1),
            blog: 10,
            published: true,
        },
        Post {
            id: 2,
            author: UserId::new(1),
            blog: 10,
            published: false,
        },
        Post {
            id: 3,
            author: UserId::new(2),
            blog: 20,
            published: true,
        },
        Post {
            id: 4,
            author: UserId::new(2),
            blog: 20,
            published: false,
        },
    ]
}

/// Two blogs owned by users 1 and 2
#[must_use]
pub fn fixture_blogs() -> Vec<Blog> {
    vec![
        Blog {
            id: 10,
            owner: UserId::new(1),
        },
        Blog {
            id: 20,
            owner: UserId::new(2),
        },
    ]
}

use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, DomainError, DomainResult, Entity};

use crate::validate::{text_len, DEFAULT_MAX_LEN};

/// Category in boundary form: the parent is referenced by name.
///
/// An empty `parent_name` marks a root (base) category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub parent_name: String,
}

impl Category {
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_name: String::new(),
        }
    }

    pub fn child(name: impl Into<String>, parent_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_name: parent_name.into(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_name.is_empty()
    }

    pub fn validate(&self) -> DomainResult<()> {
        text_len("name", &self.name, 1, DEFAULT_MAX_LEN)?;
        text_len("parent_name", &self.parent_name, 0, DEFAULT_MAX_LEN)?;
        Ok(())
    }

    /// Reject a category naming itself as parent.
    ///
    /// This only catches the direct loop; longer cycles need the stored tree.
    pub fn ensure_not_self_parented(&self) -> DomainResult<()> {
        if !self.is_root() && self.parent_name == self.name {
            return Err(DomainError::invalid_argument(
                "category parent name can't be same as category name",
            ));
        }
        Ok(())
    }
}

/// Category in stored form: the parent is referenced by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub name: String,
    pub parent: Option<CategoryId>,
}

impl Entity for CategoryRecord {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl CategoryRecord {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Only non-root categories may hold parts.
    pub fn accepts_parts(&self) -> bool {
        !self.is_root()
    }

    pub fn into_boundary(self, parent_name: Option<String>) -> Category {
        Category {
            name: self.name,
            parent_name: parent_name.unwrap_or_default(),
        }
    }
}

/// A category about to be inserted; the store assigns its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub parent: Option<CategoryId>,
}

impl NewCategory {
    pub fn into_record(self, id: CategoryId) -> CategoryRecord {
        CategoryRecord {
            id,
            name: self.name,
            parent: self.parent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_uses_parent_name() {
        let json = serde_json::to_value(Category::child("test_parts", "base_parts")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "test_parts", "parent_name": "base_parts"})
        );
    }

    #[test]
    fn parent_name_is_required_on_the_wire() {
        let res = serde_json::from_value::<Category>(serde_json::json!({"name": "abc"}));
        assert!(res.is_err());
    }

    #[test]
    fn validate_rejects_empty_and_long_names() {
        assert!(Category::root("").validate().is_err());
        assert!(Category::root("x".repeat(21)).validate().is_err());
        assert!(Category::child("ok", "p".repeat(21)).validate().is_err());
        assert!(Category::root("x".repeat(20)).validate().is_ok());
    }

    #[test]
    fn self_parenting_is_invalid_argument() {
        let err = Category::child("resistors", "resistors")
            .ensure_not_self_parented()
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::invalid_argument("category parent name can't be same as category name")
        );
        assert!(Category::root("resistors").ensure_not_self_parented().is_ok());
    }

    #[test]
    fn root_records_do_not_accept_parts() {
        let root = NewCategory { name: "base".into(), parent: None }.into_record(CategoryId::new());
        let child = NewCategory { name: "leaf".into(), parent: Some(root.id) }
            .into_record(CategoryId::new());
        assert!(!root.accepts_parts());
        assert!(child.accepts_parts());
        assert_eq!(root.into_boundary(None), Category::root("base"));
    }
}

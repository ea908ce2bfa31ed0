//! Product categories.
//!
//! The list lives in the operator's session and starts empty. Each change
//! reports the message the panel shows for it.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Add and edit form data.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryError {
    #[error("Category name is required.")]
    MissingName,

    #[error("Category not found!")]
    NotFound,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryList {
    categories: Vec<Category>,
}

impl CategoryList {
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    fn validated(form: &CategoryForm) -> Result<(String, String), CategoryError> {
        let name = form.name.trim();
        if name.is_empty() {
            return Err(CategoryError::MissingName);
        }
        Ok((name.to_string(), form.description.trim().to_string()))
    }

    /// Append a category under a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`CategoryError::MissingName`] for a blank name.
    pub fn add(&mut self, form: &CategoryForm) -> Result<&'static str, CategoryError> {
        let (name, description) = Self::validated(form)?;
        self.categories.push(Category {
            id: Uuid::new_v4().to_string(),
            name,
            description,
        });
        Ok("Category added successfully!")
    }

    /// Replace the name and description of an existing category.
    ///
    /// # Errors
    ///
    /// Returns [`CategoryError::NotFound`] for an unknown id and
    /// [`CategoryError::MissingName`] for a blank name.
    pub fn update(&mut self, id: &str, form: &CategoryForm) -> Result<&'static str, CategoryError> {
        let (name, description) = Self::validated(form)?;
        let category = self
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(CategoryError::NotFound)?;
        category.name = name;
        category.description = description;
        Ok("Category updated successfully!")
    }

    /// Remove a category.
    ///
    /// # Errors
    ///
    /// Returns [`CategoryError::NotFound`] when nothing was removed.
    pub fn delete(&mut self, id: &str) -> Result<&'static str, CategoryError> {
        let before = self.categories.len();
        self.categories.retain(|c| c.id != id);
        if self.categories.len() < before {
            Ok("Category deleted successfully!")
        } else {
            Err(CategoryError::NotFound)
        }
    }

    /// Remove every category.
    pub fn clear(&mut self) -> &'static str {
        self.categories.clear();
        "All categories cleared!"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str, description: &str) -> CategoryForm {
        CategoryForm {
            name: name.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn test_add_trims_and_assigns_ids() {
        let mut list = CategoryList::default();
        list.add(&form(" Sarees ", "Handloom")).unwrap();
        list.add(&form("Kurtas", "")).unwrap();

        let categories = list.categories();
        assert_eq!(categories[0].name, "Sarees");
        assert_eq!(categories[0].description, "Handloom");
        assert_ne!(categories[0].id, categories[1].id);
    }

    #[test]
    fn test_blank_name_is_refused() {
        let mut list = CategoryList::default();
        assert_eq!(list.add(&form("  ", "x")), Err(CategoryError::MissingName));
        assert!(list.categories().is_empty());
    }

    #[test]
    fn test_update_and_delete() {
        let mut list = CategoryList::default();
        list.add(&form("Sarees", "")).unwrap();
        let id = list.categories()[0].id.clone();

        assert_eq!(
            list.update(&id, &form("Silk Sarees", "Banarasi")),
            Ok("Category updated successfully!")
        );
        assert_eq!(list.categories()[0].name, "Silk Sarees");

        assert_eq!(list.delete(&id), Ok("Category deleted successfully!"));
        assert_eq!(list.delete(&id), Err(CategoryError::NotFound));
    }

    #[test]
    fn test_update_unknown_id() {
        let mut list = CategoryList::default();
        assert_eq!(
            list.update("nope", &form("Sarees", "")),
            Err(CategoryError::NotFound)
        );
        assert_eq!(CategoryError::NotFound.to_string(), "Category not found!");
    }

    #[test]
    fn test_clear() {
        let mut list = CategoryList::default();
        list.add(&form("Sarees", "")).unwrap();
        list.add(&form("Kurtas", "")).unwrap();
        assert_eq!(list.clear(), "All categories cleared!");
        assert!(list.categories().is_empty());
    }
}

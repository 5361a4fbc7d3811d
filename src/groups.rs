//! Custom task groups. The three system groups are fixed.

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Db, Group};

#[derive(Debug, Clone, Deserialize)]
pub struct GroupInput {
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
}

// Custom groups only, in display order
pub fn custom_groups(db: &Db) -> Vec<Group> {
    let mut groups: Vec<Group> = db.groups.iter().filter(|g| !g.is_default).cloned().collect();
    groups.sort_by_key(|g| g.display_order);
    groups
}

impl Db {
    pub fn create_group(&mut self, input: GroupInput) -> Result<&Group> {
        if input.name.trim().is_empty() {
            return Err(AppError::invalid("group name required"));
        }
        let display_order = self.groups.iter().map(|g| g.display_order).max().unwrap_or(0) + 1;
        let group = Group {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            color: input.color,
            icon: input.icon,
            is_default: false,
            display_order,
        };
        info!(group = %group.name, "group created");
        self.groups.push(group);
        Ok(&self.groups[self.groups.len() - 1])
    }

    fn custom_group_mut(&mut self, id: &str) -> Result<&mut Group> {
        let group = self
            .groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| AppError::group_not_found(id))?;
        if group.is_default {
            return Err(AppError::Conflict(format!("system group {id} cannot be changed")));
        }
        Ok(group)
    }

    pub fn update_group(&mut self, id: &str, input: GroupInput) -> Result<&Group> {
        if input.name.trim().is_empty() {
            return Err(AppError::invalid("group name required"));
        }
        let group = self.custom_group_mut(id)?;
        group.name = input.name.trim().to_string();
        group.color = input.color;
        group.icon = input.icon;
        Ok(group)
    }

    // Tasks in the group are left where they are
    pub fn delete_group(&mut self, id: &str) -> Result<Group> {
        self.custom_group_mut(id)?;
        let pos = self
            .groups
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| AppError::group_not_found(id))?;
        Ok(self.groups.remove(pos))
    }

    /// Reorder groups by the given id list; unlisted groups keep their
    /// relative order after the listed ones.
    pub fn reorder_groups(&mut self, ids: &[String]) {
        let rank = |g: &Group| {
            ids.iter()
                .position(|id| *id == g.id)
                .unwrap_or(ids.len())
        };
        self.groups.sort_by_key(|g| (rank(g), g.display_order));
        for (order, group) in self.groups.iter_mut().enumerate() {
            group.display_order = order as i64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::COMPLETED_GROUP;

    fn input(name: &str) -> GroupInput {
        GroupInput {
            name: name.into(),
            color: "#000000".into(),
            icon: Some("📚".into()),
        }
    }

    #[test]
    fn create_rename_delete() {
        let mut db = Db::default();
        let id = db.create_group(input("Study")).unwrap().id.clone();
        assert_eq!(custom_groups(&db).len(), 1);

        db.update_group(&id, input("Reading")).unwrap();
        assert_eq!(custom_groups(&db)[0].name, "Reading");

        db.delete_group(&id).unwrap();
        assert!(custom_groups(&db).is_empty());
    }

    #[test]
    fn system_groups_are_protected() {
        let mut db = Db::default();
        assert!(matches!(db.delete_group(COMPLETED_GROUP), Err(AppError::Conflict(_))));
        assert!(matches!(db.delete_group("missing"), Err(AppError::NotFound { .. })));
    }

    #[test]
    fn reorder_follows_given_ids() {
        let mut db = Db::default();
        let a = db.create_group(input("A")).unwrap().id.clone();
        let b = db.create_group(input("B")).unwrap().id.clone();
        db.reorder_groups(&[b.clone(), a.clone()]);

        let names: Vec<_> = custom_groups(&db).into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["B", "A"]);
    }
}

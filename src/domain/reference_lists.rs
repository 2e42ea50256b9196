use crate::entities::{Category, ReferenceItem, Snapshot, normalize_reference_name};
use crate::error::JournalResult;
use crate::infrastructure::StorageAdapter;
use log::debug;

/// Cached people, sites and species, in insertion order.
///
/// Removing an item never checks entries that still mention its name;
/// those entries keep the name as plain text.
#[derive(Debug, Default)]
pub struct ReferenceLists {
    people: Vec<ReferenceItem>,
    sites: Vec<ReferenceItem>,
    species: Vec<ReferenceItem>,
}

impl ReferenceLists {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            people: snapshot.people.clone(),
            sites: snapshot.sites.clone(),
            species: snapshot.species.clone(),
        }
    }

    pub fn items(&self, category: Category) -> &[ReferenceItem] {
        match category {
            Category::People => &self.people,
            Category::Sites => &self.sites,
            Category::Species => &self.species,
        }
    }

    pub fn list(&self, category: Category) -> Vec<&str> {
        self.items(category)
            .iter()
            .map(|item| item.name.as_str())
            .collect()
    }

    pub fn contains(&self, category: Category, name: &str) -> bool {
        self.items(category).iter().any(|item| item.name == name)
    }

    /// Adds `name` unless the list already has it, in which case the
    /// existing item comes back and the store is not touched.
    pub fn add(
        &mut self,
        storage: &dyn StorageAdapter,
        category: Category,
        name: &str,
    ) -> JournalResult<ReferenceItem> {
        let name = normalize_reference_name(category, name)?;

        if let Some(existing) = self.items(category).iter().find(|item| item.name == name) {
            debug!("{} `{name}` already listed", category.singular());
            return Ok(existing.clone());
        }

        let id = storage.create_reference(category, &name)?;
        let item = ReferenceItem::new(id, name);
        debug!("added {} `{}`", category.singular(), item.name);

        self.items_mut(category).push(item.clone());
        Ok(item)
    }

    /// Removes the item whose id or name is `id_or_name`. An id match wins
    /// over a name match; unknown keys are ignored.
    pub fn remove(
        &mut self,
        storage: &dyn StorageAdapter,
        category: Category,
        id_or_name: &str,
    ) -> JournalResult<bool> {
        let Some(index) = self.position(category, id_or_name) else {
            debug!("{} `{id_or_name}` not listed; nothing to remove", category.singular());
            return Ok(false);
        };

        let id = self.items(category)[index].id.clone();
        storage.delete_reference(category, &id)?;

        let removed = self.items_mut(category).remove(index);
        debug!("removed {} `{}`", category.singular(), removed.name);
        Ok(true)
    }

    fn position(&self, category: Category, id_or_name: &str) -> Option<usize> {
        let items = self.items(category);
        items
            .iter()
            .position(|item| item.id == id_or_name)
            .or_else(|| items.iter().position(|item| item.name == id_or_name))
    }

    fn items_mut(&mut self, category: Category) -> &mut Vec<ReferenceItem> {
        match category {
            Category::People => &mut self.people,
            Category::Sites => &mut self.sites,
            Category::Species => &mut self.species,
        }
    }
}

use crate::errors::StoreError;

pub trait Table {
    type Key;

    type Value;

    fn get(&self, key: Self::Key) -> Result<Option<Self::Value>, StoreError>;

    fn insert(&self, key: Self::Key, value: Self::Value) -> Result<(), StoreError>;

    /// Inserts every entry. Implementations should commit them in a single transaction.
    fn insert_batch(&self, entries: Vec<(Self::Key, Self::Value)>) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.insert(key, value)?;
        }
        Ok(())
    }
}

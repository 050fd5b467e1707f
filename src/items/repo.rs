use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::ItemError;
use super::repo_types::{Item, ItemChanges, NewItem};

/// Item persistence. Everything except `find_all` is scoped to the owner.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Item>, ItemError>;
    async fn find_by_id(&self, item_id: Uuid, user_id: Uuid) -> Result<Option<Item>, ItemError>;
    async fn create(&self, new: NewItem, user_id: Uuid) -> Result<Item, ItemError>;
    async fn update(
        &self,
        item_id: Uuid,
        user_id: Uuid,
        changes: ItemChanges,
    ) -> Result<Option<Item>, ItemError>;
    /// Returns `false` when no such item belongs to `user_id`.
    async fn delete(&self, item_id: Uuid, user_id: Uuid) -> Result<bool, ItemError>;
}

#[derive(Clone)]
pub struct PgItemRepository {
    db: PgPool,
}

impl PgItemRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    async fn find_all(&self) -> Result<Vec<Item>, ItemError> {
        let rows = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, name, price, description, sold_out, user_id, created_at
            FROM items
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, item_id: Uuid, user_id: Uuid) -> Result<Option<Item>, ItemError> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, name, price, description, sold_out, user_id, created_at
            FROM items
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(item)
    }

    async fn create(&self, new: NewItem, user_id: Uuid) -> Result<Item, ItemError> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (name, price, description, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, price, description, sold_out, user_id, created_at
            "#,
        )
        .bind(new.name)
        .bind(new.price)
        .bind(new.description)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(item)
    }

    async fn update(
        &self,
        item_id: Uuid,
        user_id: Uuid,
        changes: ItemChanges,
    ) -> Result<Option<Item>, ItemError> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET name = COALESCE($3, name),
                price = COALESCE($4, price),
                description = COALESCE($5, description),
                sold_out = COALESCE($6, sold_out)
            WHERE id = $1 AND user_id = $2
            RETURNING id, name, price, description, sold_out, user_id, created_at
            "#,
        )
        .bind(item_id)
        .bind(user_id)
        .bind(changes.name)
        .bind(changes.price)
        .bind(changes.description)
        .bind(changes.sold_out)
        .fetch_optional(&self.db)
        .await?;
        Ok(item)
    }

    async fn delete(&self, item_id: Uuid, user_id: Uuid) -> Result<bool, ItemError> {
        let result = sqlx::query(r#"DELETE FROM items WHERE id = $1 AND user_id = $2"#)
            .bind(item_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Insertion-ordered in-memory store.
#[derive(Default)]
pub struct MemoryItemRepository {
    items: RwLock<Vec<Item>>,
}

impl MemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemRepository for MemoryItemRepository {
    async fn find_all(&self) -> Result<Vec<Item>, ItemError> {
        Ok(self.items.read().await.clone())
    }

    async fn find_by_id(&self, item_id: Uuid, user_id: Uuid) -> Result<Option<Item>, ItemError> {
        let items = self.items.read().await;
        Ok(items
            .iter()
            .find(|i| i.id == item_id && i.user_id == user_id)
            .cloned())
    }

    async fn create(&self, new: NewItem, user_id: Uuid) -> Result<Item, ItemError> {
        let item = Item {
            id: Uuid::new_v4(),
            name: new.name,
            price: new.price,
            description: new.description,
            sold_out: false,
            user_id,
            created_at: OffsetDateTime::now_utc(),
        };
        self.items.write().await.push(item.clone());
        Ok(item)
    }

    async fn update(
        &self,
        item_id: Uuid,
        user_id: Uuid,
        changes: ItemChanges,
    ) -> Result<Option<Item>, ItemError> {
        let mut items = self.items.write().await;
        let Some(item) = items
            .iter_mut()
            .find(|i| i.id == item_id && i.user_id == user_id)
        else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            item.name = name;
        }
        if let Some(price) = changes.price {
            item.price = price;
        }
        if let Some(description) = changes.description {
            item.description = Some(description);
        }
        if let Some(sold_out) = changes.sold_out {
            item.sold_out = sold_out;
        }
        Ok(Some(item.clone()))
    }

    async fn delete(&self, item_id: Uuid, user_id: Uuid) -> Result<bool, ItemError> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|i| !(i.id == item_id && i.user_id == user_id));
        Ok(items.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lamp() -> NewItem {
        NewItem {
            name: "lamp".into(),
            price: 1200,
            description: None,
        }
    }

    #[tokio::test]
    async fn owner_scoping() {
        let repo = MemoryItemRepository::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let item = repo.create(lamp(), owner).await.unwrap();
        assert!(!item.sold_out);

        assert!(repo.find_by_id(item.id, owner).await.unwrap().is_some());
        assert!(repo.find_by_id(item.id, stranger).await.unwrap().is_none());
        assert!(!repo.delete(item.id, stranger).await.unwrap());
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn partial_update_and_delete() {
        let repo = MemoryItemRepository::new();
        let owner = Uuid::new_v4();
        let item = repo.create(lamp(), owner).await.unwrap();

        let updated = repo
            .update(
                item.id,
                owner,
                ItemChanges {
                    sold_out: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .expect("owned item");
        assert!(updated.sold_out);
        assert_eq!(updated.name, "lamp");
        assert_eq!(updated.price, 1200);

        assert!(repo.delete(item.id, owner).await.unwrap());
        assert!(repo.find_all().await.unwrap().is_empty());
    }
}

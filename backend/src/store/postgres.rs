//! PostgreSQL-backed store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    ItemFilter, MovementContext, MovementType, NewOrder, NewStockMovement, NewWarehouseItem,
    Order, OrderFilter, OrderPatch, OrderStatus, StockMovement, StockStatus, StockType,
    WarehouseItem,
};
use sqlx::{postgres::PgExecutor, types::Json, FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    ActivityEntry, NewLot, StockChange, StoreError, StoreResult, StoredLot, WarehouseStore,
};

const ITEM_COLUMNS: &str = "id, barcode, material, cm, mikron, current_weight, original_weight, \
     bobin_count, original_bobin_count, status, stock_type, customer_name, location, supplier, \
     order_id, notes, tags, entry_date, version, created_at, updated_at";

const MOVEMENT_COLUMNS: &str = "id, warehouse_item_id, movement_type, quantity, operator, notes, \
     context, destination, order_id, movement_date";

const ORDER_COLUMNS: &str = "id, supplier, customer_name, material, cm, mikron, quantity, unit, \
     status, price_per_unit, total_price, actual_quantity, actual_bobin_sayisi, \
     actual_total_price, is_in_warehouse, delivered_date, notes, created_at, updated_at";

/// Store backed by a Postgres connection pool
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Row for warehouse item queries
#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    barcode: String,
    material: String,
    cm: Decimal,
    mikron: Decimal,
    current_weight: Decimal,
    original_weight: Decimal,
    bobin_count: i32,
    original_bobin_count: Option<i32>,
    status: String,
    stock_type: String,
    customer_name: Option<String>,
    location: String,
    supplier: Option<String>,
    order_id: Option<Uuid>,
    notes: Option<String>,
    tags: Vec<String>,
    entry_date: DateTime<Utc>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for WarehouseItem {
    type Error = StoreError;

    fn try_from(r: ItemRow) -> Result<Self, Self::Error> {
        let status = StockStatus::parse(&r.status)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown stock status '{}'", r.status)))?;
        let stock_type = StockType::parse(&r.stock_type)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown stock type '{}'", r.stock_type)))?;
        Ok(WarehouseItem {
            id: r.id,
            barcode: r.barcode,
            material: r.material,
            cm: r.cm,
            mikron: r.mikron,
            current_weight: r.current_weight,
            original_weight: r.original_weight,
            bobin_count: r.bobin_count,
            original_bobin_count: r.original_bobin_count,
            status,
            stock_type,
            customer_name: r.customer_name,
            location: r.location,
            supplier: r.supplier,
            order_id: r.order_id,
            notes: r.notes,
            tags: r.tags,
            entry_date: r.entry_date,
            version: r.version,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Row for stock movement queries
#[derive(Debug, FromRow)]
struct MovementRow {
    id: Uuid,
    warehouse_item_id: Uuid,
    movement_type: String,
    quantity: Decimal,
    operator: String,
    notes: Option<String>,
    context: Json<MovementContext>,
    destination: Option<String>,
    order_id: Option<Uuid>,
    movement_date: DateTime<Utc>,
}

impl TryFrom<MovementRow> for StockMovement {
    type Error = StoreError;

    fn try_from(r: MovementRow) -> Result<Self, Self::Error> {
        let movement_type = MovementType::parse(&r.movement_type).ok_or_else(|| {
            StoreError::Corrupt(format!("unknown movement type '{}'", r.movement_type))
        })?;
        Ok(StockMovement {
            id: r.id,
            warehouse_item_id: r.warehouse_item_id,
            movement_type,
            quantity: r.quantity,
            operator: r.operator,
            notes: r.notes,
            context: r.context.0,
            destination: r.destination,
            order_id: r.order_id,
            movement_date: r.movement_date,
        })
    }
}

/// Row for order queries
#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    supplier: String,
    customer_name: Option<String>,
    material: String,
    cm: Decimal,
    mikron: Decimal,
    quantity: Decimal,
    unit: String,
    status: String,
    price_per_unit: Option<Decimal>,
    total_price: Option<Decimal>,
    actual_quantity: Option<Decimal>,
    actual_bobin_sayisi: Option<i32>,
    actual_total_price: Option<Decimal>,
    is_in_warehouse: bool,
    delivered_date: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(r: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::parse(&r.status)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown order status '{}'", r.status)))?;
        Ok(Order {
            id: r.id,
            supplier: r.supplier,
            customer_name: r.customer_name,
            material: r.material,
            cm: r.cm,
            mikron: r.mikron,
            quantity: r.quantity,
            unit: r.unit,
            status,
            price_per_unit: r.price_per_unit,
            total_price: r.total_price,
            actual_quantity: r.actual_quantity,
            actual_bobin_sayisi: r.actual_bobin_sayisi,
            actual_total_price: r.actual_total_price,
            is_in_warehouse: r.is_in_warehouse,
            delivered_date: r.delivered_date,
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Translate unique violations on warehouse item inserts
fn insert_item_error(err: sqlx::Error, item: &NewWarehouseItem) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            match (db_err.constraint(), item.order_id) {
                (Some("warehouse_items_order_id_key"), Some(order_id)) => {
                    return StoreError::DuplicateOrderLink { order_id };
                }
                (Some("warehouse_items_barcode_key"), _) => {
                    return StoreError::DuplicateBarcode(item.barcode.clone());
                }
                _ => {}
            }
        }
    }
    StoreError::Database(err)
}

async fn insert_item_row<'e, E>(db: E, item: &NewWarehouseItem) -> StoreResult<WarehouseItem>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, ItemRow>(&format!(
        r#"
        INSERT INTO warehouse_items (
            barcode, material, cm, mikron, current_weight, original_weight, bobin_count,
            original_bobin_count, status, stock_type, customer_name, location, supplier,
            order_id, notes, tags, entry_date
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        RETURNING {}
        "#,
        ITEM_COLUMNS
    ))
    .bind(&item.barcode)
    .bind(&item.material)
    .bind(item.cm)
    .bind(item.mikron)
    .bind(item.current_weight)
    .bind(item.original_weight)
    .bind(item.bobin_count)
    .bind(item.original_bobin_count)
    .bind(item.status.as_str())
    .bind(item.stock_type.as_str())
    .bind(&item.customer_name)
    .bind(&item.location)
    .bind(&item.supplier)
    .bind(item.order_id)
    .bind(&item.notes)
    .bind(&item.tags)
    .bind(item.entry_date)
    .fetch_one(db)
    .await
    .map_err(|e| insert_item_error(e, item))?;

    WarehouseItem::try_from(row)
}

async fn insert_movement_row<'e, E>(
    db: E,
    item_id: Uuid,
    movement: &NewStockMovement,
) -> StoreResult<StockMovement>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, MovementRow>(&format!(
        r#"
        INSERT INTO stock_movements (
            warehouse_item_id, movement_type, quantity, operator, notes, context,
            destination, order_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {}
        "#,
        MOVEMENT_COLUMNS
    ))
    .bind(item_id)
    .bind(movement.movement_type.as_str())
    .bind(movement.quantity)
    .bind(&movement.operator)
    .bind(&movement.notes)
    .bind(Json(&movement.context))
    .bind(&movement.destination)
    .bind(movement.order_id)
    .fetch_one(db)
    .await?;
    StockMovement::try_from(row)
}

/// Apply `patch` to an order; `None` when the order does not exist
async fn update_order_row<'e, E>(db: E, id: Uuid, patch: &OrderPatch) -> StoreResult<Option<Order>>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r#"
        UPDATE orders
        SET status = COALESCE($1, status),
            actual_quantity = COALESCE($2, actual_quantity),
            actual_bobin_sayisi = COALESCE($3, actual_bobin_sayisi),
            actual_total_price = COALESCE($4, actual_total_price),
            is_in_warehouse = COALESCE($5, is_in_warehouse),
            delivered_date = COALESCE($6, delivered_date),
            updated_at = NOW()
        WHERE id = $7
        RETURNING {}
        "#,
        ORDER_COLUMNS
    ))
    .bind(patch.status.map(|s| s.as_str()))
    .bind(patch.actual_quantity)
    .bind(patch.actual_bobin_sayisi)
    .bind(patch.actual_total_price)
    .bind(patch.is_in_warehouse)
    .bind(patch.delivered_date)
    .bind(id)
    .fetch_optional(db)
    .await?;
    row.map(Order::try_from).transpose()
}

#[async_trait]
impl WarehouseStore for PgStore {
    async fn list_warehouse_items(&self, filter: &ItemFilter) -> StoreResult<Vec<WarehouseItem>> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM warehouse_items WHERE TRUE", ITEM_COLUMNS));

        if let Some(material) = &filter.material {
            query.push(" AND material = ").push_bind(material.clone());
        }
        if let Some(cm) = filter.cm {
            query.push(" AND cm = ").push_bind(cm);
        }
        if let Some(mikron) = filter.mikron {
            query.push(" AND mikron = ").push_bind(mikron);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(supplier) = &filter.supplier {
            query.push(" AND supplier = ").push_bind(supplier.clone());
        }
        if let Some(min) = filter.min_weight {
            query.push(" AND current_weight >= ").push_bind(min);
        }
        if let Some(max) = filter.max_weight {
            query.push(" AND current_weight <= ").push_bind(max);
        }
        if let Some(from) = filter.date_from {
            query.push(" AND entry_date::date >= ").push_bind(from);
        }
        if let Some(to) = filter.date_to {
            query.push(" AND entry_date::date <= ").push_bind(to);
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search);
            query
                .push(" AND (barcode ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR material ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR customer_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR location ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        query.push(" ORDER BY entry_date DESC");

        let rows = query
            .build_query_as::<ItemRow>()
            .fetch_all(&self.db)
            .await?;
        convert_all(rows)
    }

    async fn get_warehouse_item(&self, id: Uuid) -> StoreResult<Option<WarehouseItem>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM warehouse_items WHERE id = $1",
            ITEM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(WarehouseItem::try_from).transpose()
    }

    async fn find_item_by_order(&self, order_id: Uuid) -> StoreResult<Option<WarehouseItem>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM warehouse_items WHERE order_id = $1",
            ITEM_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?;
        row.map(WarehouseItem::try_from).transpose()
    }

    async fn list_linked_items(&self) -> StoreResult<Vec<WarehouseItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM warehouse_items WHERE order_id IS NOT NULL ORDER BY entry_date DESC",
            ITEM_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        convert_all(rows)
    }

    async fn insert_lot(&self, lot: NewLot) -> StoreResult<StoredLot> {
        // Dropping the transaction on an early return rolls it back
        let mut tx = self.db.begin().await?;

        let item = insert_item_row(&mut *tx, &lot.item).await?;
        let receipt = insert_movement_row(&mut *tx, item.id, &lot.receipt).await?;
        let order = match &lot.order_update {
            Some((order_id, patch)) => Some(
                update_order_row(&mut *tx, *order_id, patch)
                    .await?
                    .ok_or(StoreError::NotFound {
                        resource: "Order",
                        id: *order_id,
                    })?,
            ),
            None => None,
        };

        tx.commit().await?;
        Ok(StoredLot {
            item,
            receipt,
            order,
        })
    }

    async fn apply_stock_change(
        &self,
        change: StockChange,
    ) -> StoreResult<(WarehouseItem, Option<StockMovement>)> {
        let item = change.item;
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            UPDATE warehouse_items
            SET current_weight = $1, bobin_count = $2, status = $3, stock_type = $4,
                customer_name = $5, location = $6, notes = $7,
                version = version + 1, updated_at = NOW()
            WHERE id = $8 AND version = $9
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(item.current_weight)
        .bind(item.bobin_count)
        .bind(item.status.as_str())
        .bind(item.stock_type.as_str())
        .bind(&item.customer_name)
        .bind(&item.location)
        .bind(&item.notes)
        .bind(item.id)
        .bind(item.version)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM warehouse_items WHERE id = $1)",
            )
            .bind(item.id)
            .fetch_one(&self.db)
            .await?;
            return Err(if exists {
                StoreError::VersionConflict { id: item.id }
            } else {
                StoreError::NotFound {
                    resource: "Warehouse item",
                    id: item.id,
                }
            });
        };

        let movement = match &change.movement {
            Some(movement) => Some(insert_movement_row(&mut *tx, item.id, movement).await?),
            None => None,
        };

        tx.commit().await?;
        Ok((WarehouseItem::try_from(row)?, movement))
    }

    async fn delete_warehouse_item(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM warehouse_items WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn max_barcode_sequence(&self, prefix: &str) -> StoreResult<Option<u32>> {
        let max = sqlx::query_scalar::<_, Option<i64>>(
            r#"
            SELECT MAX(CAST(SUBSTRING(barcode FROM $2) AS BIGINT))
            FROM warehouse_items
            WHERE barcode LIKE $1 AND SUBSTRING(barcode FROM $2) ~ '^[0-9]{1,9}$'
            "#,
        )
        .bind(format!("{}%", prefix))
        .bind(prefix.chars().count() as i32 + 1)
        .fetch_one(&self.db)
        .await?;
        Ok(max.and_then(|m| u32::try_from(m).ok()))
    }

    async fn list_movements(&self, item_id: Option<Uuid>) -> StoreResult<Vec<StockMovement>> {
        let rows = sqlx::query_as::<_, MovementRow>(&format!(
            r#"
            SELECT {}
            FROM stock_movements
            WHERE $1::uuid IS NULL OR warehouse_item_id = $1
            ORDER BY movement_date DESC
            "#,
            MOVEMENT_COLUMNS
        ))
        .bind(item_id)
        .fetch_all(&self.db)
        .await?;
        convert_all(rows)
    }

    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM orders WHERE TRUE", ORDER_COLUMNS));
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(supplier) = &filter.supplier {
            query.push(" AND supplier = ").push_bind(supplier.clone());
        }
        if let Some(material) = &filter.material {
            query.push(" AND material = ").push_bind(material.clone());
        }
        query.push(" ORDER BY created_at DESC");

        let rows = query
            .build_query_as::<OrderRow>()
            .fetch_all(&self.db)
            .await?;
        convert_all(rows)
    }

    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO orders (
                supplier, customer_name, material, cm, mikron, quantity, unit, status,
                price_per_unit, total_price, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(&order.supplier)
        .bind(&order.customer_name)
        .bind(&order.material)
        .bind(order.cm)
        .bind(order.mikron)
        .bind(order.quantity)
        .bind(&order.unit)
        .bind(order.status.as_str())
        .bind(order.price_per_unit)
        .bind(order.total_price)
        .bind(&order.notes)
        .fetch_one(&self.db)
        .await?;
        Order::try_from(row)
    }

    async fn update_order(&self, id: Uuid, patch: &OrderPatch) -> StoreResult<Order> {
        update_order_row(&self.db, id, patch)
            .await?
            .ok_or(StoreError::NotFound {
                resource: "Order",
                id,
            })
    }

    async fn delete_order(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_activity(&self, entry: &ActivityEntry) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (action, resource_type, resource_id, details, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&entry.action)
        .bind(&entry.resource_type)
        .bind(&entry.resource_id)
        .bind(&entry.details)
        .bind(entry.created_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}

//! SQLite-backed order and strategy store
//!
//! Single-file database in WAL mode. The store owns the schema; monetary
//! columns are TEXT holding decimal strings, dates are RFC 3339 TEXT.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::{
    ActiveTradeflow, ExecutedOrder, OrderDraft, OrderPatch, OrderStore, PairInfo, PendingOrder,
    StoreError, TradeflowSource,
};
use crate::types::{Credential, Order, OrderStatus, OrderType, Side};

const ORDER_COLUMNS: &str = "id, asset_id, user_id, strategy_id, pair_order_id, side, status, \
     type_order, open_price, close_price, target_price, quantity, id_order_exchange, \
     open_date, close_date, is_active, result, performance";

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.create_tables()?;
        info!("SQLite store initialized: {}", path.display());
        Ok(store)
    }

    /// In-memory database, used by tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.create_tables()?;
        Ok(store)
    }

    fn create_tables(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                is_active INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS credentials (
                user_id INTEGER PRIMARY KEY REFERENCES users(id),
                api_key TEXT NOT NULL,
                secret_key TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS assets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS strategies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                name TEXT NOT NULL,
                config_strategy TEXT NOT NULL,
                profit TEXT NOT NULL DEFAULT '0',
                performance TEXT NOT NULL DEFAULT '0'
            );

            CREATE TABLE IF NOT EXISTS tradeflows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                asset_id INTEGER NOT NULL REFERENCES assets(id),
                strategy_id INTEGER NOT NULL REFERENCES strategies(id),
                is_active INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                asset_id INTEGER NOT NULL REFERENCES assets(id),
                user_id INTEGER NOT NULL REFERENCES users(id),
                strategy_id INTEGER REFERENCES strategies(id),
                pair_order_id INTEGER REFERENCES orders(id),
                side TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'PENDENTE',
                type_order TEXT NOT NULL,
                open_price TEXT NOT NULL,
                close_price TEXT,
                target_price TEXT,
                quantity TEXT NOT NULL,
                id_order_exchange TEXT NOT NULL DEFAULT '',
                open_date TEXT NOT NULL,
                close_date TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                result TEXT,
                performance TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);
            CREATE INDEX IF NOT EXISTS idx_orders_slots ON orders(status, side, asset_id);
            CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id);",
        )?;

        debug!("Database schema created/verified");
        Ok(())
    }

    fn insert_draft(
        tx: &Transaction<'_>,
        draft: &OrderDraft,
        pair_order_id: Option<i64>,
    ) -> rusqlite::Result<i64> {
        tx.execute(
            "INSERT INTO orders
             (asset_id, user_id, strategy_id, pair_order_id, side, status, type_order,
              open_price, target_price, quantity, id_order_exchange, open_date, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 1)",
            params![
                draft.asset_id,
                draft.user_id,
                draft.strategy_id,
                pair_order_id,
                draft.side.as_str(),
                OrderStatus::Pendente.as_str(),
                draft.type_order.as_str(),
                draft.open_price.to_string(),
                draft.target_price.to_string(),
                draft.quantity.to_string(),
                draft.id_order_exchange,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(tx.last_insert_rowid())
    }

    /// Load one order by id
    pub fn get_order(&self, order_id: i64) -> Result<Order, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"))?;

        match stmt.query_row(params![order_id], order_from_row) {
            Ok(order) => Ok(order),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::NotFound("order")),
            Err(err) => Err(err.into()),
        }
    }

    /// Accumulated (profit, performance) totals for a strategy
    pub fn strategy_totals(&self, strategy_id: i64) -> Result<(Decimal, Decimal), StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT profit, performance FROM strategies WHERE id = ?1")?;

        let (profit, performance): (String, String) =
            match stmt.query_row(params![strategy_id], |row| Ok((row.get(0)?, row.get(1)?))) {
                Ok(totals) => totals,
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    return Err(StoreError::NotFound("strategy"))
                }
                Err(err) => return Err(err.into()),
            };

        Ok((parse_decimal(&profit)?, parse_decimal(&performance)?))
    }

    // ==================== Seeding utilities ====================
    // User/asset/strategy management lives outside the engine; these exist
    // for operational seeding and the test suites.

    pub fn insert_user(&self, name: &str, email: &str) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO users (name, email) VALUES (?1, ?2)",
            params![name, email],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_credential(&self, user_id: i64, credential: &Credential) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO credentials (user_id, api_key, secret_key) VALUES (?1, ?2, ?3)",
            params![user_id, credential.api_key, credential.secret_key],
        )?;
        Ok(())
    }

    pub fn insert_asset(&self, symbol: &str) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("INSERT INTO assets (symbol) VALUES (?1)", params![symbol])?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_strategy(
        &self,
        user_id: i64,
        name: &str,
        config_strategy: &str,
    ) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO strategies (user_id, name, config_strategy) VALUES (?1, ?2, ?3)",
            params![user_id, name, config_strategy],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_tradeflow(
        &self,
        asset_id: i64,
        strategy_id: i64,
        is_active: bool,
    ) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO tradeflows (asset_id, strategy_id, is_active) VALUES (?1, ?2, ?3)",
            params![asset_id, strategy_id, is_active as i64],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

impl OrderStore for SqliteStore {
    fn create_pair(&self, buy: &OrderDraft, sell: &OrderDraft) -> Result<(i64, i64), StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let buy_id = Self::insert_draft(&tx, buy, None)?;
        let sell_id = Self::insert_draft(&tx, sell, Some(buy_id))?;
        tx.execute(
            "UPDATE orders SET pair_order_id = ?1 WHERE id = ?2",
            params![sell_id, buy_id],
        )?;

        tx.commit()?;

        debug!(buy_id, sell_id, "Order pair created");
        Ok((buy_id, sell_id))
    }

    fn pending_with_exchange_id(&self) -> Result<Vec<PendingOrder>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT o.id, o.asset_id, o.user_id, o.strategy_id, o.pair_order_id, o.side,
                    o.status, o.type_order, o.open_price, o.close_price, o.target_price,
                    o.quantity, o.id_order_exchange, o.open_date, o.close_date, o.is_active,
                    o.result, o.performance,
                    a.symbol, c.api_key, c.secret_key,
                    p.id, p.close_price, p.target_price
             FROM orders o
             JOIN assets a ON a.id = o.asset_id
             JOIN credentials c ON c.user_id = o.user_id
             LEFT JOIN orders p ON p.id = o.pair_order_id
             WHERE o.status = 'PENDENTE' AND o.id_order_exchange != ''
             ORDER BY o.id",
        )?;

        let orders = stmt
            .query_map([], |row| {
                let order = order_from_row(row)?;
                let pair = match row.get::<_, Option<i64>>(21)? {
                    Some(id) => Some(PairInfo {
                        id,
                        close_price: opt_decimal_col(row, 22)?,
                        target_price: opt_decimal_col(row, 23)?,
                    }),
                    None => None,
                };
                Ok(PendingOrder {
                    order,
                    symbol: row.get(18)?,
                    credential: Credential::new(
                        row.get::<_, String>(19)?,
                        row.get::<_, String>(20)?,
                    ),
                    pair,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(orders)
    }

    fn count_pending_sell(&self, asset_id: i64) -> Result<u32, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM orders
             WHERE status = 'PENDENTE' AND side = 'SELL' AND asset_id = ?1",
            params![asset_id],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }

    fn apply_fill_update(&self, order_id: i64, patch: &OrderPatch) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(status) = patch.status {
            sets.push("status = ?");
            values.push(Value::from(status.as_str().to_string()));
        }
        if let Some(close_date) = patch.close_date {
            sets.push("close_date = ?");
            values.push(Value::from(close_date.to_rfc3339()));
        }
        if let Some(close_price) = patch.close_price {
            sets.push("close_price = ?");
            values.push(Value::from(close_price.to_string()));
        }
        if let Some(ref id_order_exchange) = patch.id_order_exchange {
            sets.push("id_order_exchange = ?");
            values.push(Value::from(id_order_exchange.clone()));
        }
        if let Some(result) = patch.result {
            sets.push("result = ?");
            values.push(Value::from(result.to_string()));
        }
        if let Some(performance) = patch.performance {
            sets.push("performance = ?");
            values.push(Value::from(performance.to_string()));
        }

        if !sets.is_empty() {
            values.push(Value::from(order_id));
            let updated = tx.execute(
                &format!("UPDATE orders SET {} WHERE id = ?", sets.join(", ")),
                params_from_iter(values),
            )?;
            if updated == 0 {
                return Err(StoreError::NotFound("order"));
            }
        }

        // Profit roll-up: read-modify-write on the parent strategy totals
        if let Some((strategy_id, result, performance)) = patch.booked_profit() {
            let (name, profit_raw, performance_raw): (String, String, String) = match tx.query_row(
                "SELECT name, profit, performance FROM strategies WHERE id = ?1",
                params![strategy_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            ) {
                Ok(strategy) => strategy,
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    return Err(StoreError::NotFound("strategy"))
                }
                Err(err) => return Err(err.into()),
            };

            let new_profit = parse_decimal(&profit_raw)? + result;
            let new_performance = parse_decimal(&performance_raw)? + performance;

            tx.execute(
                "UPDATE strategies SET profit = ?1, performance = ?2 WHERE id = ?3",
                params![new_profit.to_string(), new_performance.to_string(), strategy_id],
            )?;

            info!(
                strategy = %name,
                profit = %new_profit,
                performance = %new_performance,
                "Strategy totals updated"
            );
        }

        tx.commit()?;
        Ok(())
    }

    fn distinct_pending_symbols(
        &self,
        user_id: i64,
        excluded_symbol: &str,
    ) -> Result<Vec<String>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT a.symbol
             FROM orders o
             JOIN assets a ON a.id = o.asset_id
             WHERE o.status = 'PENDENTE' AND o.user_id = ?1 AND a.symbol != ?2
             ORDER BY a.symbol",
        )?;

        let symbols = stmt
            .query_map(params![user_id, excluded_symbol], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(symbols)
    }

    fn bulk_cancel(&self, user_id: i64) -> Result<u64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let cancelled = conn.execute(
            "UPDATE orders SET status = 'CANCELADO'
             WHERE status = 'PENDENTE' AND user_id = ?1",
            params![user_id],
        )?;

        debug!(user_id, cancelled, "Pending orders bulk-cancelled");
        Ok(cancelled as u64)
    }

    fn user_credential(&self, user_id: i64) -> Result<Credential, StoreError> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT api_key, secret_key FROM credentials WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(Credential::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                ))
            },
        ) {
            Ok(credential) => Ok(credential),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::NotFound("credential")),
            Err(err) => Err(err.into()),
        }
    }

    fn asset_symbol(&self, asset_id: i64) -> Result<String, StoreError> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT symbol FROM assets WHERE id = ?1",
            params![asset_id],
            |row| row.get(0),
        ) {
            Ok(symbol) => Ok(symbol),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::NotFound("asset")),
            Err(err) => Err(err.into()),
        }
    }

    fn record_executed_order(&self, record: &ExecutedOrder) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let price = record.price.map(|p| p.to_string());

        conn.execute(
            "INSERT INTO orders
             (asset_id, user_id, side, status, type_order, open_price, close_price,
              quantity, id_order_exchange, open_date, close_date, is_active)
             VALUES (?1, ?2, ?3, 'EXECUTADA', 'MARKET', ?4, ?4, ?5, ?6, ?7, ?7, 1)",
            params![
                record.asset_id,
                record.user_id,
                record.side.as_str(),
                price.unwrap_or_else(|| "0".to_string()),
                record.quantity.to_string(),
                record.id_order_exchange,
                now,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }
}

impl TradeflowSource for SqliteStore {
    fn active_tradeflows(&self) -> Result<Vec<ActiveTradeflow>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT t.id, t.asset_id, a.symbol, s.id, s.user_id, u.name, u.email,
                    s.config_strategy, c.api_key, c.secret_key
             FROM tradeflows t
             JOIN assets a ON a.id = t.asset_id
             JOIN strategies s ON s.id = t.strategy_id
             JOIN users u ON u.id = s.user_id
             JOIN credentials c ON c.user_id = u.id
             WHERE t.is_active = 1
             ORDER BY t.id",
        )?;

        let flows = stmt
            .query_map([], |row| {
                Ok(ActiveTradeflow {
                    tradeflow_id: row.get(0)?,
                    asset_id: row.get(1)?,
                    symbol: row.get(2)?,
                    strategy_id: row.get(3)?,
                    user_id: row.get(4)?,
                    user_name: row.get(5)?,
                    user_email: row.get(6)?,
                    config_strategy: row.get(7)?,
                    credential: Credential::new(
                        row.get::<_, String>(8)?,
                        row.get::<_, String>(9)?,
                    ),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(flows)
    }
}

// ==================== Row mapping helpers ====================

fn invalid_column<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, err.into())
}

fn parse_decimal(text: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(text).map_err(|_| StoreError::Numeric(text.to_string()))
}

fn decimal_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text).map_err(|err| invalid_column(idx, err))
}

fn opt_decimal_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| Decimal::from_str(&t).map_err(|err| invalid_column(idx, err)))
        .transpose()
}

fn date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| invalid_column(idx, err))
}

fn opt_date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        DateTime::parse_from_rfc3339(&t)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|err| invalid_column(idx, err))
    })
    .transpose()
}

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        asset_id: row.get(1)?,
        user_id: row.get(2)?,
        strategy_id: row.get(3)?,
        pair_order_id: row.get(4)?,
        side: row
            .get::<_, String>(5)?
            .parse::<Side>()
            .map_err(|err| invalid_column(5, err))?,
        status: row
            .get::<_, String>(6)?
            .parse::<OrderStatus>()
            .map_err(|err| invalid_column(6, err))?,
        type_order: row
            .get::<_, String>(7)?
            .parse::<OrderType>()
            .map_err(|err| invalid_column(7, err))?,
        open_price: decimal_col(row, 8)?,
        close_price: opt_decimal_col(row, 9)?,
        target_price: opt_decimal_col(row, 10)?,
        quantity: decimal_col(row, 11)?,
        id_order_exchange: row.get(12)?,
        open_date: date_col(row, 13)?,
        close_date: opt_date_col(row, 14)?,
        is_active: row.get::<_, i64>(15)? != 0,
        result: opt_decimal_col(row, 16)?,
        performance: opt_decimal_col(row, 17)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    struct Fixture {
        store: SqliteStore,
        user_id: i64,
        asset_id: i64,
        strategy_id: i64,
    }

    fn fixture() -> Fixture {
        let store = SqliteStore::open_in_memory().unwrap();
        let user_id = store.insert_user("Richard", "richard@example.com").unwrap();
        store
            .insert_credential(user_id, &Credential::new("api-key", "secret-key"))
            .unwrap();
        let asset_id = store.insert_asset("BTCUSDT").unwrap();
        let strategy_id = store
            .insert_strategy(
                user_id,
                "btc-grid",
                r#"{"quantityGrids":3,"profitTarget":10,"variableOrder":5,"valueOrder":1000}"#,
            )
            .unwrap();

        Fixture {
            store,
            user_id,
            asset_id,
            strategy_id,
        }
    }

    fn draft(fx: &Fixture, side: Side, exchange_id: &str) -> OrderDraft {
        OrderDraft {
            asset_id: fx.asset_id,
            user_id: fx.user_id,
            strategy_id: fx.strategy_id,
            side,
            type_order: OrderType::Limit,
            open_price: dec!(100.00),
            target_price: dec!(110.00),
            quantity: dec!(10.00),
            id_order_exchange: exchange_id.to_string(),
        }
    }

    #[test]
    fn test_create_pair_links_both_directions() {
        let fx = fixture();
        let (buy_id, sell_id) = fx
            .store
            .create_pair(&draft(&fx, Side::Buy, "1001"), &draft(&fx, Side::Sell, ""))
            .unwrap();

        let buy = fx.store.get_order(buy_id).unwrap();
        let sell = fx.store.get_order(sell_id).unwrap();

        assert_eq!(buy.pair_order_id, Some(sell_id));
        assert_eq!(sell.pair_order_id, Some(buy_id));
        assert_eq!(buy.status, OrderStatus::Pendente);
        assert_eq!(sell.status, OrderStatus::Pendente);
        assert_eq!(buy.id_order_exchange, "1001");
        assert_eq!(sell.id_order_exchange, "");
    }

    #[test]
    fn test_pending_with_exchange_id_skips_unsubmitted_sells() {
        let fx = fixture();
        fx.store
            .create_pair(&draft(&fx, Side::Buy, "1001"), &draft(&fx, Side::Sell, ""))
            .unwrap();

        let pending = fx.store.pending_with_exchange_id().unwrap();
        assert_eq!(pending.len(), 1);
        assert!(pending[0].order.is_live());
        assert_eq!(pending[0].order.side, Side::Buy);
        assert_eq!(pending[0].symbol, "BTCUSDT");
        assert_eq!(pending[0].credential.api_key, "api-key");

        let pair = pending[0].pair.as_ref().unwrap();
        assert_eq!(pair.close_price, None);
        assert_eq!(pair.target_price, Some(dec!(110.00)));
    }

    #[test]
    fn test_count_pending_sell_scopes_by_asset_and_side() {
        let fx = fixture();
        let other_asset = fx.store.insert_asset("ETHUSDT").unwrap();

        fx.store
            .create_pair(&draft(&fx, Side::Buy, "1"), &draft(&fx, Side::Sell, ""))
            .unwrap();
        fx.store
            .create_pair(&draft(&fx, Side::Buy, "2"), &draft(&fx, Side::Sell, ""))
            .unwrap();

        assert_eq!(fx.store.count_pending_sell(fx.asset_id).unwrap(), 2);
        assert_eq!(fx.store.count_pending_sell(other_asset).unwrap(), 0);
    }

    #[test]
    fn test_apply_fill_update_marks_executed() {
        let fx = fixture();
        let (buy_id, _) = fx
            .store
            .create_pair(&draft(&fx, Side::Buy, "1001"), &draft(&fx, Side::Sell, ""))
            .unwrap();

        fx.store
            .apply_fill_update(buy_id, &OrderPatch::fill(dec!(100.00), Utc::now()))
            .unwrap();

        let buy = fx.store.get_order(buy_id).unwrap();
        assert_eq!(buy.status, OrderStatus::Executada);
        assert_eq!(buy.close_price, Some(dec!(100.00)));
        assert!(buy.close_date.is_some());
    }

    #[test]
    fn test_profit_rollup_accumulates() {
        let fx = fixture();
        let (_, sell_id) = fx
            .store
            .create_pair(&draft(&fx, Side::Buy, "1001"), &draft(&fx, Side::Sell, ""))
            .unwrap();

        let mut patch = OrderPatch::fill(dec!(110.00), Utc::now());
        patch.result = Some(dec!(100.00));
        patch.strategy_id = Some(fx.strategy_id);
        patch.performance = Some(dec!(10.00));
        fx.store.apply_fill_update(sell_id, &patch).unwrap();

        let (profit, performance) = fx.store.strategy_totals(fx.strategy_id).unwrap();
        assert_eq!(profit, dec!(100.00));
        assert_eq!(performance, dec!(10.00));

        // A second close adds on top of the running totals
        let (_, second_sell) = fx
            .store
            .create_pair(&draft(&fx, Side::Buy, "1002"), &draft(&fx, Side::Sell, ""))
            .unwrap();
        let mut patch = OrderPatch::fill(dec!(104.50), Utc::now());
        patch.result = Some(dec!(45.00));
        patch.strategy_id = Some(fx.strategy_id);
        patch.performance = Some(dec!(4.50));
        fx.store.apply_fill_update(second_sell, &patch).unwrap();

        let (profit, performance) = fx.store.strategy_totals(fx.strategy_id).unwrap();
        assert_eq!(profit, dec!(145.00));
        assert_eq!(performance, dec!(14.50));
    }

    #[test]
    fn test_fill_update_without_profit_leaves_strategy_untouched() {
        let fx = fixture();
        let (buy_id, _) = fx
            .store
            .create_pair(&draft(&fx, Side::Buy, "1001"), &draft(&fx, Side::Sell, ""))
            .unwrap();

        fx.store
            .apply_fill_update(buy_id, &OrderPatch::fill(dec!(100.00), Utc::now()))
            .unwrap();

        let (profit, performance) = fx.store.strategy_totals(fx.strategy_id).unwrap();
        assert_eq!(profit, Decimal::ZERO);
        assert_eq!(performance, Decimal::ZERO);
    }

    #[test]
    fn test_apply_fill_update_unknown_order() {
        let fx = fixture();
        let err = fx
            .store
            .apply_fill_update(9999, &OrderPatch::fill(dec!(1), Utc::now()))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("order")));
    }

    #[test]
    fn test_bulk_cancel_only_touches_users_pending_orders() {
        let fx = fixture();
        let other_user = fx.store.insert_user("Flavio", "flavio@example.com").unwrap();
        fx.store
            .insert_credential(other_user, &Credential::new("k2", "s2"))
            .unwrap();

        let (buy_id, sell_id) = fx
            .store
            .create_pair(&draft(&fx, Side::Buy, "1"), &draft(&fx, Side::Sell, ""))
            .unwrap();

        let mut other_draft = draft(&fx, Side::Buy, "2");
        other_draft.user_id = other_user;
        let mut other_sell = draft(&fx, Side::Sell, "");
        other_sell.user_id = other_user;
        let (other_buy, _) = fx.store.create_pair(&other_draft, &other_sell).unwrap();

        // One of the first user's orders is already executed; it must not move
        fx.store
            .apply_fill_update(buy_id, &OrderPatch::fill(dec!(100.00), Utc::now()))
            .unwrap();

        let cancelled = fx.store.bulk_cancel(fx.user_id).unwrap();
        assert_eq!(cancelled, 1);

        assert_eq!(
            fx.store.get_order(sell_id).unwrap().status,
            OrderStatus::Cancelado
        );
        assert_eq!(
            fx.store.get_order(buy_id).unwrap().status,
            OrderStatus::Executada
        );
        assert_eq!(
            fx.store.get_order(other_buy).unwrap().status,
            OrderStatus::Pendente
        );
    }

    #[test]
    fn test_distinct_pending_symbols_excludes_quote() {
        let fx = fixture();
        let eth = fx.store.insert_asset("ETHUSDT").unwrap();
        let usdt = fx.store.insert_asset("USDT").unwrap();

        fx.store
            .create_pair(&draft(&fx, Side::Buy, "1"), &draft(&fx, Side::Sell, ""))
            .unwrap();
        let mut eth_buy = draft(&fx, Side::Buy, "2");
        eth_buy.asset_id = eth;
        let mut eth_sell = draft(&fx, Side::Sell, "");
        eth_sell.asset_id = eth;
        fx.store.create_pair(&eth_buy, &eth_sell).unwrap();
        let mut usdt_buy = draft(&fx, Side::Buy, "3");
        usdt_buy.asset_id = usdt;
        let mut usdt_sell = draft(&fx, Side::Sell, "");
        usdt_sell.asset_id = usdt;
        fx.store.create_pair(&usdt_buy, &usdt_sell).unwrap();

        let symbols = fx
            .store
            .distinct_pending_symbols(fx.user_id, "USDT")
            .unwrap();
        assert_eq!(symbols, vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]);
    }

    #[test]
    fn test_active_tradeflows_join() {
        let fx = fixture();
        fx.store
            .insert_tradeflow(fx.asset_id, fx.strategy_id, true)
            .unwrap();
        fx.store
            .insert_tradeflow(fx.asset_id, fx.strategy_id, false)
            .unwrap();

        let flows = fx.store.active_tradeflows().unwrap();
        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].symbol, "BTCUSDT");
        assert_eq!(flows[0].user_name, "Richard");
        assert_eq!(flows[0].credential.secret_key, "secret-key");
    }

    #[test]
    fn test_missing_lookups_surface_not_found() {
        let fx = fixture();
        assert!(matches!(
            fx.store.user_credential(9999),
            Err(StoreError::NotFound("credential"))
        ));
        assert!(matches!(
            fx.store.asset_symbol(9999),
            Err(StoreError::NotFound("asset"))
        ));
    }

    #[test]
    fn test_record_executed_order() {
        let fx = fixture();
        let order_id = fx
            .store
            .record_executed_order(&ExecutedOrder {
                asset_id: fx.asset_id,
                user_id: fx.user_id,
                side: Side::Buy,
                quantity: dec!(0.5),
                price: Some(dec!(200.00)),
                id_order_exchange: "7001".to_string(),
            })
            .unwrap();

        let order = fx.store.get_order(order_id).unwrap();
        assert_eq!(order.status, OrderStatus::Executada);
        assert_eq!(order.type_order, OrderType::Market);
        assert_eq!(order.open_price, dec!(200.00));
        assert_eq!(order.close_price, Some(dec!(200.00)));
        assert_eq!(order.strategy_id, None);
        assert_eq!(order.id_order_exchange, "7001");
        assert!(order.close_date.is_some());
    }
}

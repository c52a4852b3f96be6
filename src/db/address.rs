// Address registry: the deposit addresses this service has issued.
// - insert_if_absent(owner, smart?, chain) -> inserted?
// - find_owner_by_address(address) -> owner address, matching either the
//   owner EOA or its smart account

use crate::cache::OwnerCache;
use crate::db::{is_unique_violation, now_unix};
use crate::models::{Chain, DepositAddress};
use crate::validation::normalize_address;
use sqlx::{AnyPool, Row};
use tracing::{debug, info};

#[derive(Clone)]
pub struct AddressRegistry {
    pool: AnyPool,
    cache: OwnerCache,
}

impl AddressRegistry {
    pub fn new(pool: AnyPool, cache: OwnerCache) -> Self {
        Self { pool, cache }
    }

    /// Store a newly issued address. Returns `false` when the owner (or the
    /// smart account) is already registered; that is not an error.
    pub async fn insert_if_absent(
        &self,
        owner_address: &str,
        smart_address: Option<&str>,
        chain: Chain,
    ) -> Result<bool, sqlx::Error> {
        let owner = normalize_address(owner_address);
        let smart = smart_address.map(normalize_address);

        let result = sqlx::query(
            "INSERT INTO deposit_addresses (address, smart_address, chain, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&owner)
        .bind(smart.clone())
        .bind(chain.as_str())
        .bind(now_unix())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!("Registered {} deposit address {}", chain, owner);
                Ok(true)
            }
            Err(e) if is_unique_violation(&e) => {
                debug!("Deposit address {} already registered", owner);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Resolve a deposit target to the owner address it belongs to. Deposits
    /// may land on the owner EOA or on its smart account; both resolve to the
    /// owner.
    pub async fn find_owner_by_address(&self, address: &str) -> Result<Option<String>, sqlx::Error> {
        let address = normalize_address(address);

        if let Some(owner) = self.cache.get(&address).await {
            return Ok(Some(owner));
        }

        let row = sqlx::query(
            "SELECT address FROM deposit_addresses
             WHERE address = ? OR smart_address = ?
             LIMIT 1",
        )
        .bind(&address)
        .bind(&address)
        .fetch_optional(&self.pool)
        .await?;

        let owner = row.map(|row| row.get::<String, _>("address"));
        if let Some(owner) = &owner {
            self.cache.insert(&address, owner).await;
        }

        Ok(owner)
    }

    pub async fn get(&self, owner_address: &str) -> Result<Option<DepositAddress>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT address, smart_address, chain, created_at
             FROM deposit_addresses WHERE address = ?",
        )
        .bind(normalize_address(owner_address))
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let chain: String = row.get("chain");
            let chain = chain.parse::<Chain>().map_err(|e| sqlx::Error::ColumnDecode {
                index: "chain".to_string(),
                source: e.into(),
            })?;

            Ok(DepositAddress {
                owner_address: row.get("address"),
                smart_address: row.get::<Option<String>, _>("smart_address"),
                chain,
                created_at: row.get("created_at"),
            })
        })
        .transpose()
    }
}

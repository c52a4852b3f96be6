// Account provisioning: ask the gateway for a new account, then record it in
// the address registry so deposits to it can be attributed.

use crate::db::AddressRegistry;
use crate::models::{Chain, EvmAccountResponse, SolanaAccountResponse};
use crate::provisioning::{EvmSmartAccount, ProvisioningError, ProvisioningGateway};
use crate::validation::validate_address;
use tracing::info;

/// Creates an owner EOA and a smart account controlled by it. The smart
/// account is the deposit target; both addresses resolve to the owner.
pub async fn provision_evm_account(
    gateway: &dyn ProvisioningGateway,
    registry: &AddressRegistry,
) -> Result<EvmAccountResponse, ProvisioningError> {
    let owner = gateway.create_evm_account().await?;
    validate_address(&owner.address, Chain::Evm)?;

    let smart = gateway.create_evm_smart_account(&owner.address).await?;
    validate_address(&smart.address, Chain::Evm)?;

    registry
        .insert_if_absent(&owner.address, Some(smart.address.as_str()), Chain::Evm)
        .await?;

    info!("Provisioned EVM smart account {} (owner {})", smart.address, owner.address);

    Ok(EvmAccountResponse {
        address: smart.address.clone(),
        owner_address: owner.address,
        smart_address: smart.address,
        account_type: EvmSmartAccount::ACCOUNT_TYPE.to_string(),
    })
}

pub async fn provision_solana_account(
    gateway: &dyn ProvisioningGateway,
    registry: &AddressRegistry,
) -> Result<SolanaAccountResponse, ProvisioningError> {
    let account = gateway.create_solana_account().await?;
    validate_address(&account.address, Chain::Solana)?;

    registry.insert_if_absent(&account.address, None, Chain::Solana).await?;

    info!("Provisioned Solana account {}", account.address);

    Ok(SolanaAccountResponse {
        address: account.address,
    })
}

// ============================================================================
// Token Accounts - mints and wallet-controlled balances
// ============================================================================
//
// Before a party can use an escrow or a market it needs a mint to trade and
// an associated account for each mint it holds. One associated account per
// (owner, mint), living at a derived address.
//
// ============================================================================

use tracing::info;

use crate::address::{associated_account_address, Address};
use crate::error::{LedgerError, LedgerResult};
use crate::instruction::Signers;
use crate::ledger::{Account, Changeset, Mint};

/// Resolve `owner`'s account for `mint` and check it really belongs to them
pub fn user_account(
    cs: &Changeset<'_>,
    program_id: &Address,
    owner: &Address,
    mint: &Address,
) -> LedgerResult<Address> {
    let address = associated_account_address(owner, mint, program_id)?;
    let account = cs.account(&address)?;
    if account.is_program_owned() || account.owner != *owner {
        return Err(LedgerError::NotAuthorized(format!(
            "account {} is not controlled by {}",
            address.short(),
            owner.short()
        )));
    }
    Ok(address)
}

/// Like `user_account`, but re-opens a missing account so payouts from a
/// program account always have somewhere to land
pub fn receiving_account(
    cs: &mut Changeset<'_>,
    program_id: &Address,
    owner: &Address,
    mint: &Address,
) -> LedgerResult<Address> {
    let address = associated_account_address(owner, mint, program_id)?;
    if !cs.account_exists(&address) {
        cs.create_account(Account::user(address, *owner, *mint))?;
        info!(owner = %owner.short(), mint = %mint.short(), "👤 Account re-opened for payout");
    }
    user_account(cs, program_id, owner, mint)
}

/// Register a new mint controlled by `authority`
pub fn create_mint(
    cs: &mut Changeset<'_>,
    signers: &Signers<'_>,
    mint: Address,
    decimals: u8,
    authority: Address,
) -> LedgerResult<()> {
    signers.require(&authority, "create mint")?;
    cs.create_mint(Mint { address: mint, decimals, mint_authority: Some(authority), supply: 0 })?;
    info!(mint = %mint.short(), decimals, "🪙 Mint created");
    Ok(())
}

/// Issue `amount` new tokens into `owner`'s account. Only the mint authority signs.
pub fn mint_to(
    cs: &mut Changeset<'_>,
    program_id: &Address,
    signers: &Signers<'_>,
    mint: &Address,
    owner: &Address,
    amount: u64,
) -> LedgerResult<Address> {
    let record = cs.mint(mint)?;
    let authority = record.mint_authority.ok_or_else(|| {
        LedgerError::NotAuthorized(format!("mint {} has no external authority", mint.short()))
    })?;
    signers.require(&authority, "mint to")?;
    if amount == 0 {
        return Err(LedgerError::InvalidArgument("mint amount must be positive".into()));
    }

    let destination = user_account(cs, program_id, owner, mint)?;
    cs.issue(&destination, amount)?;
    info!(mint = %mint.short(), owner = %owner.short(), amount, "📥 Minted");
    Ok(destination)
}

/// Open `owner`'s empty associated account for `mint`
pub fn open_account(
    cs: &mut Changeset<'_>,
    program_id: &Address,
    signers: &Signers<'_>,
    owner: &Address,
    mint: &Address,
) -> LedgerResult<Address> {
    signers.require(owner, "open account")?;
    cs.mint(mint)?;
    let address = associated_account_address(owner, mint, program_id)?;
    cs.create_account(Account::user(address, *owner, *mint))?;
    info!(owner = %owner.short(), mint = %mint.short(), "👤 Account opened");
    Ok(address)
}

/// Close an empty user account. Program accounts are never closed this way.
pub fn close_account(
    cs: &mut Changeset<'_>,
    program_id: &Address,
    signers: &Signers<'_>,
    owner: &Address,
    mint: &Address,
) -> LedgerResult<Address> {
    signers.require(owner, "close account")?;
    let address = user_account(cs, program_id, owner, mint)?;
    let account = cs.account(&address)?;
    if account.amount != 0 {
        return Err(LedgerError::InvalidArgument(format!(
            "account still holds {}",
            account.amount
        )));
    }
    cs.close_account(&address)?;
    info!(owner = %owner.short(), mint = %mint.short(), "🗑️ Account closed");
    Ok(address)
}

//! The donation flow: what the platform's request boundary calls.
//!
//! # Data Flow
//! ```text
//! DonationRequest {project, donor, amount, asset, txHash, benefits?}
//!     → duplicate check (no ledger call spent on replays)
//!     → settlement.verify_payment (the trust boundary)
//!     → recorder.record (Donation row + atomic balance credit)
//!     → benefits.issue_for_donation (per-benefit, isolated)
//!     → DonationOutcome {donation, benefits_issued}
//! ```
//!
//! Verification failure is terminal: nothing is recorded and the client
//! must produce a fresh signed transaction.

use std::sync::Arc;

use crate::benefits::issuance::{BenefitIssuer, SkippedBenefit};
use crate::donations::recorder::DonationRecorder;
use crate::donations::types::{Donation, DonationStatus};
use crate::error::{EngineError, Result};
use crate::ledger::amount::Amount;
use crate::ledger::asset::Asset;
use crate::ledger::strkey;
use crate::settlement::service::SettlementService;
use crate::store::{Store, TransactionLog, TxType};

/// What the request boundary hands the engine.
#[derive(Debug, Clone)]
pub struct DonationRequest {
    pub project_id: String,
    pub donor_wallet: String,
    pub amount: Amount,
    pub asset: Asset,
    pub tx_hash: String,
    /// Network passphrase the client claims the payment settled on.
    pub network: String,
    /// Donor-selected benefits; `None` means scan for every qualifying one.
    pub selected_benefit_ids: Option<Vec<String>>,
}

/// What the request boundary gets back.
#[derive(Debug)]
pub struct DonationOutcome {
    pub donation: Donation,
    pub benefits_issued: Vec<crate::benefits::types::BenefitHolding>,
    pub benefits_skipped: Vec<SkippedBenefit>,
}

pub struct DonationFlow {
    store: Arc<dyn Store>,
    recorder: DonationRecorder,
    settlement: Arc<SettlementService>,
    benefits: BenefitIssuer,
}

impl DonationFlow {
    pub fn new(
        store: Arc<dyn Store>,
        settlement: Arc<SettlementService>,
        benefits: BenefitIssuer,
    ) -> Self {
        Self {
            recorder: DonationRecorder::new(store.clone()),
            store,
            settlement,
            benefits,
        }
    }

    /// Wire a complete flow from configuration and a store.
    pub fn from_config(config: &crate::config::EngineConfig, store: Arc<dyn Store>) -> Result<Self> {
        use crate::custody::crypto::MasterKey;
        use crate::custody::issuer::IssuerCustodian;
        use crate::ledger::factory::TxFactory;
        use crate::ledger::horizon::HorizonClient;

        let horizon = Arc::new(HorizonClient::new(&config.network, config.timeouts.horizon_secs)?);
        let settlement = Arc::new(SettlementService::new(horizon.clone(), &config.retries));
        let factory = Arc::new(TxFactory::new(horizon.clone(), config.network.passphrase.clone()));
        let custodian = Arc::new(IssuerCustodian::new(
            store.clone(),
            horizon.clone(),
            MasterKey::from_config(&config.custody)?,
            config.network.kind,
        ));
        let benefits = BenefitIssuer::new(
            store.clone(),
            custodian,
            factory,
            settlement.clone(),
            horizon,
        );
        Ok(Self::new(store, settlement, benefits))
    }

    /// Process one claimed donation end to end.
    pub async fn process(&self, request: DonationRequest) -> Result<DonationOutcome> {
        self.validate(&request)?;

        // Replays are rejected before verification spends a ledger call.
        self.recorder.check_duplicate(&request.tx_hash).await?;

        let project_wallet = self
            .store
            .project_wallet(&request.project_id)
            .await?
            .ok_or_else(|| {
                EngineError::Validation(format!("unknown project '{}'", request.project_id))
            })?;

        let verification = self
            .settlement
            .verify_payment(&request.tx_hash, &project_wallet, request.amount, &request.asset)
            .await?;
        if !verification.valid {
            let reason = verification
                .error
                .unwrap_or_else(|| "settlement mismatch".into());
            self.store
                .append_tx_log(TransactionLog::failure(
                    TxType::Payment,
                    Some(request.tx_hash.clone()),
                    reason.clone(),
                ))
                .await?;
            tracing::warn!(tx_hash = %request.tx_hash, reason = %reason, "Donation rejected");
            return Err(EngineError::VerificationFailed(reason));
        }

        let mut donation = self
            .recorder
            .record(
                &request.project_id,
                &request.donor_wallet,
                request.amount,
                request.asset.clone(),
                &request.tx_hash,
                &request.network,
            )
            .await?;
        self.store
            .append_tx_log(TransactionLog::success(TxType::Payment, request.tx_hash.clone()))
            .await?;

        self.store
            .update_donation_status(&donation.id, DonationStatus::BenefitsProcessing)
            .await?;
        let report = self
            .benefits
            .issue_for_donation(&donation, request.selected_benefit_ids.as_deref())
            .await?;
        self.store
            .update_donation_status(&donation.id, DonationStatus::Settled)
            .await?;
        donation.status = DonationStatus::Settled;

        tracing::info!(
            donation = %donation.id,
            issued = report.issued.len(),
            skipped = report.skipped.len(),
            "Donation settled"
        );
        Ok(DonationOutcome {
            donation,
            benefits_issued: report.issued,
            benefits_skipped: report.skipped,
        })
    }

    fn validate(&self, request: &DonationRequest) -> Result<()> {
        strkey::decode_account_id(&request.donor_wallet)?;
        if !request.amount.is_positive() {
            return Err(EngineError::Validation("donation amount must be positive".into()));
        }
        if request.tx_hash.len() != 64 || !request.tx_hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(EngineError::Validation(format!(
                "'{}' is not a transaction hash",
                request.tx_hash
            )));
        }
        Ok(())
    }
}

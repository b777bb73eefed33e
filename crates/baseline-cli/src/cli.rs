//! Command-line interface definitions using clap
//!
//! This module defines the CLI structure using clap's derive API,
//! implementing the parameter wrapper pattern for clean separation between
//! CLI framework concerns and core domain logic:
//!
//! ```text
//! User Input → CLI Args (clap) → Core Params → Engine
//! ```
//!
//! Each command has an `*Args` struct with clap derives and an
//! `into_params()` conversion (or a `From` impl) to the corresponding
//! `baseline_core::params` type, so the argument surface can evolve without
//! touching the core crate. The [`Cli`] handler at the bottom drives the
//! engine and renders the markdown output.

use anyhow::{Context, Result};
use baseline_core::{
    display::{CreateResult, DeleteResult, ImpactList, OperationStatus, VariationList,
        VersionHistory},
    params::{Actor, AddImpact, CreateMilestone, CreateVariation, Id, ProjectId, RejectVariation,
        SignVariation, SubmitVariation, UpdateImpact},
    Engine, EngineError,
};
use clap::{Args, Subcommand, ValueEnum};

use crate::renderer::TerminalRenderer;

/// Create a new draft variation
#[derive(Args)]
pub struct CreateVariationArgs {
    /// Project the variation belongs to
    pub project_id: u64,
    /// Title of the variation
    pub title: String,
    /// Classification of the change
    #[arg(short = 't', long = "type", value_enum, default_value_t = VariationTypeArg::Combined)]
    pub variation_type: VariationTypeArg,
    /// Optional detailed description of the change
    #[arg(short, long)]
    pub description: Option<String>,
    /// Optional reason for the change
    #[arg(short, long)]
    pub reason: Option<String>,
    /// Identity of the creating user
    #[arg(long)]
    pub user: String,
}

impl CreateVariationArgs {
    fn into_params(self) -> (CreateVariation, Actor) {
        let actor = Actor::new(self.user);
        (
            CreateVariation {
                project_id: self.project_id,
                variation_type: self.variation_type.to_string(),
                title: self.title,
                description: self.description,
                reason: self.reason,
                form_data: None,
            },
            actor,
        )
    }
}

/// List a project's variations
#[derive(Args)]
pub struct ListVariationsArgs {
    /// Project to list variations for
    pub project_id: u64,
}

impl From<ListVariationsArgs> for ProjectId {
    fn from(val: ListVariationsArgs) -> Self {
        ProjectId {
            project_id: val.project_id,
        }
    }
}

/// Show details of a specific variation
#[derive(Args)]
pub struct ShowVariationArgs {
    /// Unique identifier of the variation
    pub id: u64,
}

impl From<ShowVariationArgs> for Id {
    fn from(val: ShowVariationArgs) -> Self {
        Id { id: val.id }
    }
}

/// Submit a draft variation for approval
#[derive(Args)]
pub struct SubmitVariationArgs {
    /// Unique identifier of the variation to submit
    pub id: u64,
    /// Summary of the overall impact
    #[arg(short, long)]
    pub summary: String,
}

impl From<SubmitVariationArgs> for SubmitVariation {
    fn from(val: SubmitVariationArgs) -> Self {
        SubmitVariation {
            id: val.id,
            impact_summary: val.summary,
        }
    }
}

/// Record a party's signature on a variation
///
/// The second signature approves the variation and applies it to the
/// project baselines immediately.
#[derive(Args)]
pub struct SignVariationArgs {
    /// Unique identifier of the variation to sign
    pub id: u64,
    /// Signing party
    #[arg(short, long, value_enum)]
    pub party: PartyArg,
    /// Identity of the signer
    #[arg(long)]
    pub signer: String,
}

impl SignVariationArgs {
    fn into_params(self) -> (SignVariation, Actor) {
        let actor = Actor::new(self.signer);
        (
            SignVariation {
                id: self.id,
                party: self.party.to_string(),
            },
            actor,
        )
    }
}

/// Reject a variation
#[derive(Args)]
pub struct RejectVariationArgs {
    /// Unique identifier of the variation to reject
    pub id: u64,
    /// Reason for the rejection
    #[arg(short, long)]
    pub reason: String,
    /// Identity of the rejecting user
    #[arg(long)]
    pub user: String,
}

impl RejectVariationArgs {
    fn into_params(self) -> (RejectVariation, Actor) {
        let actor = Actor::new(self.user);
        (
            RejectVariation {
                id: self.id,
                reason: self.reason,
            },
            actor,
        )
    }
}

/// Delete a variation permanently
#[derive(Args)]
pub struct DeleteVariationArgs {
    /// Unique identifier of the variation to delete
    pub id: u64,
    /// Confirm the deletion (required to prevent accidental deletion)
    #[arg(long)]
    pub confirm: bool,
}

#[derive(Subcommand)]
pub enum VariationCommands {
    /// Create a new draft variation
    #[command(alias = "c")]
    Create(CreateVariationArgs),
    /// List a project's variations
    #[command(aliases = ["l", "ls"])]
    List(ListVariationsArgs),
    /// Show details of a specific variation
    #[command(alias = "s")]
    Show(ShowVariationArgs),
    /// Submit a draft variation for approval
    Submit(SubmitVariationArgs),
    /// Record a party's signature on a variation
    Sign(SignVariationArgs),
    /// Reject a variation
    Reject(RejectVariationArgs),
    /// Reset a rejected variation back to draft
    Reset(ShowVariationArgs),
    /// Apply an approved variation to the project baselines
    ///
    /// Normally runs automatically on the second signature; use this to
    /// retry after a failed automatic apply.
    Apply(ShowVariationArgs),
    /// Print the frozen approval certificate of an applied variation
    Certificate(ShowVariationArgs),
    /// Delete a variation permanently
    #[command(aliases = ["d", "rm"])]
    Delete(DeleteVariationArgs),
}

/// Add a milestone to a variation's impact ledger
#[derive(Args)]
pub struct AddImpactArgs {
    /// Variation to add the impact to
    pub variation_id: u64,
    /// Milestone being affected
    pub milestone_id: u64,
    /// Optional rationale for this milestone's change
    #[arg(long)]
    pub rationale: Option<String>,
}

impl From<AddImpactArgs> for AddImpact {
    fn from(val: AddImpactArgs) -> Self {
        AddImpact {
            variation_id: val.variation_id,
            milestone_id: val.milestone_id,
            rationale: val.rationale,
        }
    }
}

/// Update the proposed values of an impact row
#[derive(Args)]
pub struct UpdateImpactArgs {
    /// Unique identifier of the impact row to update
    pub id: u64,
    /// New proposed baseline cost
    #[arg(long)]
    pub cost: Option<f64>,
    /// New proposed baseline start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,
    /// New proposed baseline end date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,
    /// Updated rationale for this milestone's change
    #[arg(long)]
    pub rationale: Option<String>,
}

impl From<UpdateImpactArgs> for UpdateImpact {
    fn from(val: UpdateImpactArgs) -> Self {
        UpdateImpact {
            id: val.id,
            new_cost: val.cost,
            new_start: val.start,
            new_end: val.end,
            rationale: val.rationale,
        }
    }
}

/// Identify a single impact row
#[derive(Args)]
pub struct ImpactIdArgs {
    /// Unique identifier of the impact row
    pub id: u64,
}

impl From<ImpactIdArgs> for Id {
    fn from(val: ImpactIdArgs) -> Self {
        Id { id: val.id }
    }
}

/// Identify a variation whose ledger is operated on
#[derive(Args)]
pub struct ImpactLedgerArgs {
    /// Unique identifier of the owning variation
    pub variation_id: u64,
}

#[derive(Subcommand)]
pub enum ImpactCommands {
    /// Add a milestone to a variation's impact ledger
    #[command(alias = "a")]
    Add(AddImpactArgs),
    /// Update the proposed values of an impact row
    #[command(alias = "u")]
    Update(UpdateImpactArgs),
    /// Remove a single impact row
    #[command(alias = "rm")]
    Remove(ImpactIdArgs),
    /// Remove every impact row from a variation
    Clear(ImpactLedgerArgs),
    /// List the impact ledger of a variation
    #[command(aliases = ["l", "ls"])]
    List(ImpactLedgerArgs),
}

/// Create a milestone
#[derive(Args)]
pub struct CreateMilestoneArgs {
    /// Project the milestone belongs to
    pub project_id: u64,
    /// Name of the milestone
    pub name: String,
    /// Initial baseline cost
    #[arg(long, default_value_t = 0.0)]
    pub cost: f64,
    /// Initial baseline start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,
    /// Initial baseline end date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,
}

impl From<CreateMilestoneArgs> for CreateMilestone {
    fn from(val: CreateMilestoneArgs) -> Self {
        CreateMilestone {
            project_id: val.project_id,
            name: val.name,
            baseline_cost: val.cost,
            baseline_start: val.start,
            baseline_end: val.end,
        }
    }
}

/// Identify a single milestone
#[derive(Args)]
pub struct MilestoneIdArgs {
    /// Unique identifier of the milestone
    pub id: u64,
}

impl From<MilestoneIdArgs> for Id {
    fn from(val: MilestoneIdArgs) -> Self {
        Id { id: val.id }
    }
}

#[derive(Subcommand)]
pub enum MilestoneCommands {
    /// Create a milestone
    #[command(alias = "c")]
    Create(CreateMilestoneArgs),
    /// Show details of a specific milestone
    #[command(alias = "s")]
    Show(MilestoneIdArgs),
    /// Show a milestone's baseline version history
    #[command(alias = "h")]
    History(MilestoneIdArgs),
}

/// Show per-project variation statistics
#[derive(Args)]
pub struct SummaryArgs {
    /// Project to summarize
    pub project_id: u64,
}

impl From<SummaryArgs> for ProjectId {
    fn from(val: SummaryArgs) -> Self {
        ProjectId {
            project_id: val.project_id,
        }
    }
}

/// Command-line argument representation of variation types
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum VariationTypeArg {
    ScopeExtension,
    ScopeReduction,
    TimeExtension,
    CostAdjustment,
    Combined,
}

impl std::fmt::Display for VariationTypeArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VariationTypeArg::ScopeExtension => "scope_extension",
            VariationTypeArg::ScopeReduction => "scope_reduction",
            VariationTypeArg::TimeExtension => "time_extension",
            VariationTypeArg::CostAdjustment => "cost_adjustment",
            VariationTypeArg::Combined => "combined",
        };
        write!(f, "{s}")
    }
}

/// Command-line argument representation of the signing parties
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum PartyArg {
    Supplier,
    Customer,
}

impl std::fmt::Display for PartyArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PartyArg::Supplier => "supplier",
            PartyArg::Customer => "customer",
        };
        write!(f, "{s}")
    }
}

/// Command handler that drives the engine and renders markdown output.
pub struct Cli {
    engine: Engine,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(engine: Engine, renderer: TerminalRenderer) -> Self {
        Self { engine, renderer }
    }

    pub async fn handle_variation_command(&self, command: VariationCommands) -> Result<()> {
        match command {
            VariationCommands::Create(args) => {
                let (params, actor) = args.into_params();
                let variation = self
                    .engine
                    .create_variation(&params, &actor)
                    .await
                    .context("Failed to create variation")?;
                self.renderer.render(&CreateResult::new(variation).to_string())
            }
            VariationCommands::List(args) => {
                let params = args.into();
                let summaries = self
                    .engine
                    .list_with_stats(&params)
                    .await
                    .context("Failed to list variations")?;
                let title = format!("Variations for project {}", params.project_id);
                self.renderer
                    .render(&VariationList::with_title(&summaries, &title).to_string())
            }
            VariationCommands::Show(args) => {
                let params: Id = args.into();
                match self
                    .engine
                    .get_with_details(&params)
                    .await
                    .context("Failed to get variation")?
                {
                    Some(variation) => self.renderer.render(&variation.to_string()),
                    None => Err(EngineError::VariationNotFound { id: params.id }.into()),
                }
            }
            VariationCommands::Submit(args) => {
                let variation = self
                    .engine
                    .submit_for_approval(&args.into())
                    .await
                    .context("Failed to submit variation")?;
                self.renderer.render(&variation.to_string())
            }
            VariationCommands::Sign(args) => {
                let (params, actor) = args.into_params();
                let variation = self
                    .engine
                    .sign_variation(&params, &actor)
                    .await
                    .context("Failed to sign variation")?;
                self.renderer.render(&variation.to_string())
            }
            VariationCommands::Reject(args) => {
                let (params, actor) = args.into_params();
                let variation = self
                    .engine
                    .reject_variation(&params, &actor)
                    .await
                    .context("Failed to reject variation")?;
                self.renderer.render(&variation.to_string())
            }
            VariationCommands::Reset(args) => {
                let variation = self
                    .engine
                    .reset_to_draft(&args.into())
                    .await
                    .context("Failed to reset variation")?;
                self.renderer.render(&variation.to_string())
            }
            VariationCommands::Apply(args) => {
                let variation = self
                    .engine
                    .apply_variation(&args.into())
                    .await
                    .context("Failed to apply variation")?;
                self.renderer.render(&variation.to_string())
            }
            VariationCommands::Certificate(args) => {
                let params: Id = args.into();
                let variation = self
                    .engine
                    .get_with_details(&params)
                    .await
                    .context("Failed to get variation")?
                    .ok_or(EngineError::VariationNotFound { id: params.id })?;
                match variation.certificate_data {
                    Some(data) => {
                        println!("{}", serde_json::to_string_pretty(&data)?);
                        Ok(())
                    }
                    None => self.renderer.render(
                        &OperationStatus::failure(format!(
                            "Variation {} has not been applied; no certificate exists",
                            variation.reference
                        ))
                        .to_string(),
                    ),
                }
            }
            VariationCommands::Delete(args) => {
                if !args.confirm {
                    return self.renderer.render(
                        &OperationStatus::failure(
                            "Deletion requires --confirm".to_string(),
                        )
                        .to_string(),
                    );
                }
                let deleted = self
                    .engine
                    .delete_variation(&Id { id: args.id })
                    .await
                    .context("Failed to delete variation")?;
                self.renderer.render(
                    &DeleteResult::with_title(deleted.id, "variation", deleted.title).to_string(),
                )
            }
        }
    }

    pub async fn handle_impact_command(&self, command: ImpactCommands) -> Result<()> {
        match command {
            ImpactCommands::Add(args) => {
                let impact = self
                    .engine
                    .add_impact(&args.into())
                    .await
                    .context("Failed to add impact")?;
                self.renderer.render(&CreateResult::new(impact).to_string())
            }
            ImpactCommands::Update(args) => {
                let impact = self
                    .engine
                    .update_impact(&args.into())
                    .await
                    .context("Failed to update impact")?;
                self.renderer.render(&impact.to_string())
            }
            ImpactCommands::Remove(args) => {
                let removed = self
                    .engine
                    .remove_impact(&args.into())
                    .await
                    .context("Failed to remove impact")?;
                self.renderer
                    .render(&DeleteResult::new(removed.id, "milestone impact").to_string())
            }
            ImpactCommands::Clear(args) => {
                let removed = self
                    .engine
                    .clear_impacts(&Id {
                        id: args.variation_id,
                    })
                    .await
                    .context("Failed to clear impacts")?;
                self.renderer.render(
                    &OperationStatus::success(format!("Removed {removed} milestone impact(s)"))
                        .to_string(),
                )
            }
            ImpactCommands::List(args) => {
                let variation = self
                    .engine
                    .get_with_details(&Id {
                        id: args.variation_id,
                    })
                    .await
                    .context("Failed to get variation")?
                    .ok_or(EngineError::VariationNotFound {
                        id: args.variation_id,
                    })?;
                let title = format!("Milestone impacts of {}", variation.reference);
                self.renderer
                    .render(&ImpactList::with_title(&variation.impacts, &title).to_string())
            }
        }
    }

    pub async fn handle_milestone_command(&self, command: MilestoneCommands) -> Result<()> {
        match command {
            MilestoneCommands::Create(args) => {
                let milestone = self
                    .engine
                    .create_milestone(&args.into())
                    .await
                    .context("Failed to create milestone")?;
                self.renderer
                    .render(&CreateResult::new(milestone).to_string())
            }
            MilestoneCommands::Show(args) => {
                let params: Id = args.into();
                match self
                    .engine
                    .get_milestone(&params)
                    .await
                    .context("Failed to get milestone")?
                {
                    Some(milestone) => self.renderer.render(&milestone.to_string()),
                    None => Err(EngineError::MilestoneNotFound { id: params.id }.into()),
                }
            }
            MilestoneCommands::History(args) => {
                let params: Id = args.into();
                let milestone = self
                    .engine
                    .get_milestone(&params)
                    .await
                    .context("Failed to get milestone")?
                    .ok_or(EngineError::MilestoneNotFound { id: params.id })?;
                let versions = self
                    .engine
                    .baseline_history(&params)
                    .await
                    .context("Failed to read baseline history")?;
                self.renderer
                    .render(&VersionHistory::new(&milestone, &versions).to_string())
            }
        }
    }

    pub async fn show_summary(&self, args: SummaryArgs) -> Result<()> {
        let summary = self
            .engine
            .project_summary(&args.into())
            .await
            .context("Failed to compute project summary")?;
        self.renderer.render(&summary.to_string())
    }
}

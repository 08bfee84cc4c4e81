use crate::infra::{
    describe_file, parse_property_status, parse_status_filter, CollectingNotifier, PortalState,
    RecordingNavigator,
};
use clap::Args;
use land_registry::config::WizardConfig;
use land_registry::error::AppError;
use land_registry::session::{AccessGate, InMemorySessionStore, LoginService, Portal};
use land_registry::workflows::registry::{
    list_properties, search, PropertyId, RecordError, RegistryCatalog, RegistryOverview,
    RegistryStore, StatusFilter, VerificationStatus,
};
use land_registry::workflows::registry::overview::DEFAULT_RECENT_ACTIVITIES;
use land_registry::workflows::wizard::{
    FlowBlueprint, FlowCollaborators, Notification, PropertyContext, ReviewSummary,
    SubmissionFlow, SubmissionGating, SubmissionResult,
};
use std::sync::Arc;
use std::time::Duration;

const DEMO_OFFICER: &str = "Sarah Johnson";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Submission gating for the wizards (lenient or strict). Defaults to lenient.
    #[arg(long)]
    pub(crate) gating: Option<SubmissionGating>,
    /// Skip the simulated upload, submission and review delays.
    #[arg(long)]
    pub(crate) instant: bool,
    /// Skip the ownership transfer portion of the demo.
    #[arg(long)]
    pub(crate) skip_transfer: bool,
}

#[derive(Args, Debug)]
pub(crate) struct SearchArgs {
    /// Property id, plot number, survey number or token id
    pub(crate) query: String,
}

#[derive(Args, Debug)]
pub(crate) struct QueueArgs {
    /// Which registrations to list: all, pending or under-review
    #[arg(long, default_value = "all", value_parser = parse_status_filter)]
    pub(crate) status: StatusFilter,
}

#[derive(Args, Debug)]
pub(crate) struct ListArgs {
    /// Only list properties with this status: pending, under-review, verified or rejected
    #[arg(long, value_parser = parse_property_status)]
    pub(crate) status: Option<VerificationStatus>,
    /// Show at most this many properties
    #[arg(long)]
    pub(crate) limit: Option<usize>,
}

pub(crate) fn run_property_listing(args: ListArgs) -> Result<(), AppError> {
    let catalog = RegistryCatalog::seeded()?;
    let rows = list_properties(&catalog, args.status, args.limit);

    if rows.is_empty() {
        println!("No properties to show");
    }
    for row in rows {
        println!(
            "- #{} {} [{}] {} | {} | registered {}",
            row.id, row.plot_number, row.status_label, row.title, row.land_area, row.registered_on
        );
    }

    Ok(())
}

pub(crate) fn run_search(args: SearchArgs) -> Result<(), AppError> {
    let catalog = RegistryCatalog::seeded()?;

    match search(&catalog, &args.query) {
        Some(record) => {
            println!("{} ({})", record.title, record.status_label);
            println!("- Plot {} | Survey {}", record.plot_number, record.survey_number);
            println!("- Owner {} | NIC {}", record.owner.name, record.owner.nic);
            println!(
                "- {}, {}, {} | {} | {}",
                record.location.address,
                record.location.district,
                record.location.province,
                record.land_area,
                record.property_type
            );
            println!("- Token {}", record.token_id);
        }
        None => println!("No property matches '{}'", args.query.trim()),
    }

    Ok(())
}

pub(crate) fn run_queue_listing(args: QueueArgs) -> Result<(), AppError> {
    let portal = PortalState::new(RegistryCatalog::seeded()?, WizardConfig::default());
    let counts = portal.queue.counts();

    println!(
        "Verification queue: {} pending | {} under review | {} high priority",
        counts.pending, counts.under_review, counts.high_priority
    );
    for registration in portal.queue.list(args.status) {
        println!(
            "- #{} {} [{}] {} | submitted by {} on {} | {:?} priority",
            registration.id,
            registration.plot_number,
            registration.status.label(),
            registration.title,
            registration.submitted_by,
            registration.submitted_on,
            registration.priority
        );
    }

    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        gating,
        instant,
        skip_transfer,
    } = args;

    let mut wizard = WizardConfig::default();
    if let Some(gating) = gating {
        wizard.gating = gating;
    }
    if instant {
        wizard.upload_tick = Duration::ZERO;
        wizard.registration_delay = Duration::ZERO;
        wizard.transfer_delay = Duration::ZERO;
        wizard.review_delay = Duration::ZERO;
    }

    println!("Land registry portal demo ({:?} gating)", wizard.gating);

    let session = InMemorySessionStore::default();
    let login = LoginService::new(wizard.review_delay)
        .login(&session, Portal::Admin, "officer@landregistry.lk", "registry")
        .await?;
    println!(
        "- Signed in as {} -> {} ({})",
        login.user.name, login.redirect, login.notification.message
    );
    println!(
        "- Admin pages: {:?}",
        AccessGate::admin_only().check(&session)
    );

    let portal = PortalState::new(RegistryCatalog::seeded()?, wizard);

    println!("\nProperty registration");
    let notifier = Arc::new(CollectingNotifier::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let collaborators = portal.registration_collaborators(notifier.clone(), navigator.clone());
    let registration = [
        ("propertyTitle", "Residential Plot - Kandy"),
        ("plotNumber", "KAN-03-2024-017"),
        ("address", "12 Temple Road, Kandy"),
        ("district", "Kandy"),
        ("province", "Central"),
        ("landArea", "15.5"),
        ("propertyType", "residential"),
        ("ownerNIC", "198512345678"),
    ];
    let result = walk_flow(
        &portal,
        FlowBlueprint::registration(),
        collaborators,
        &registration,
    )
    .await?;
    render_outcome(&result, &notifier.take(), navigator.destination());

    println!("\nVerification queue");
    let counts = portal.queue.counts();
    println!(
        "- {} pending | {} under review | {} high priority",
        counts.pending, counts.under_review, counts.high_priority
    );
    if let Some(newest) = portal.queue.list(StatusFilter::Pending).pop() {
        let approved = portal.queue.approve(newest.id, DEMO_OFFICER).await?;
        println!(
            "- {} approved by {} -> {}",
            approved.plot_number,
            DEMO_OFFICER,
            approved.status.label()
        );
    }

    if !skip_transfer {
        println!("\nOwnership transfer");
        let property = portal
            .catalog
            .property(PropertyId(2))
            .ok_or(RecordError::UnknownProperty(PropertyId(2)))?;
        let notifier = Arc::new(CollectingNotifier::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let collaborators = portal.transfer_collaborators(notifier.clone(), navigator.clone());
        let buyer = [
            ("buyerName", "Kamal Fernando"),
            ("buyerNIC", "199254301234"),
            ("buyerEmail", "kamal@example.com"),
            ("buyerPhone", "+94 71 555 0101"),
            ("buyerAddress", "8 Hill Street, Kandy"),
            ("saleAmount", "18500000"),
        ];
        let result = walk_flow(
            &portal,
            FlowBlueprint::transfer(PropertyContext::from(&property)),
            collaborators,
            &buyer,
        )
        .await?;
        render_outcome(&result, &notifier.take(), navigator.destination());

        if let Some(record) = search(portal.catalog.as_ref(), &property.plot_number) {
            println!(
                "- Public record now shows {} (NIC {})",
                record.owner.name, record.owner.nic
            );
        }
    }

    let overview = RegistryOverview::collect(portal.catalog.as_ref(), DEFAULT_RECENT_ACTIVITIES);
    println!("\nRegistry overview");
    println!(
        "- {} properties | {} verified | {} awaiting verification | {} rejected | {} transfers",
        overview.total_properties,
        overview.verified_properties,
        overview.pending_verification,
        overview.rejected_applications,
        overview.transfers
    );
    println!("- {} officers online", overview.active_officers);
    for activity in &overview.recent_activities {
        println!(
            "  - {} | {} | {}",
            activity.action, activity.plot_number, activity.actor
        );
    }

    Ok(())
}

async fn walk_flow(
    portal: &PortalState,
    blueprint: FlowBlueprint,
    collaborators: FlowCollaborators,
    fields: &[(&str, &str)],
) -> Result<SubmissionResult, AppError> {
    let flow = SubmissionFlow::new(blueprint, portal.wizard.flow_settings(), collaborators);
    println!("- Step 1: {}", flow.current_step());

    for (name, value) in fields {
        flow.set_field(name, *value)?;
    }

    let documents: Vec<_> = flow
        .blueprint()
        .documents()
        .iter()
        .filter(|requirement| requirement.required)
        .map(|requirement| requirement.document)
        .collect();
    for document in documents {
        let file = describe_file(&format!("{}.pdf", document.id()), 180_000, None);
        let rejections = flow.select_files(document, vec![file])?;
        for rejection in rejections {
            println!("  Rejected {}", rejection.message());
        }
    }
    flow.wait_for_uploads().await;

    while !flow.is_final_step() {
        let index = flow.advance()?;
        println!("- Step {}: {}", index + 1, flow.current_step());
    }

    render_review(&flow.review());
    Ok(flow.submit().await?)
}

fn render_review(review: &ReviewSummary) {
    println!("  {} summary", review.flow_label);
    if let Some(property) = &review.property {
        println!(
            "    Property: {} ({}) held by {}",
            property.title, property.plot_number, property.current_owner
        );
    }
    for field in review.fields.iter().filter(|field| !field.value.is_empty()) {
        println!("    {}: {}", field.label, field.value);
    }
    for document in &review.documents {
        println!(
            "    {}: {} ({}%)",
            document.label, document.status_label, document.progress
        );
    }
}

fn render_outcome(
    result: &SubmissionResult,
    notifications: &[Notification],
    destination: Option<String>,
) {
    match result {
        SubmissionResult::Success { reference } => println!("- Submitted as {reference}"),
        SubmissionResult::Failure { reason } => println!("- Submission failed: {reason}"),
    }
    for notification in notifications {
        println!("  [{:?}] {}", notification.severity, notification.message);
    }
    if let Some(destination) = destination {
        println!("- Continue at {destination}");
    }
}

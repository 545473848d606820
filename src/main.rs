use std::sync::Arc;

use intake_wizard::api::build_router;
use intake_wizard::config::AppConfig;
use intake_wizard::console::{ConsoleOutcome, ConsoleWizard};
use intake_wizard::onboarding::{StepCatalog, Wizard};
use intake_wizard::submission::{Forwarder, WebhookForwarder};
use intake_wizard::upload::UploadGateway;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let _log_guard = intake_wizard::logging::init(&config.logging)?;

    let console_mode = std::env::args().skip(1).any(|a| a == "--console");

    eprintln!("📝 Intake Wizard v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Webhook: {}", config.webhook.url);
    eprintln!(
        "   Uploads: {}",
        if config.upload.blob_enabled() {
            "blob storage"
        } else {
            "inline (BLOB_READ_WRITE_TOKEN not set)"
        }
    );

    let uploads = UploadGateway::from_config(&config.upload);
    let forwarder: Arc<dyn Forwarder> = Arc::new(WebhookForwarder::new(&config.webhook)?);

    if console_mode {
        eprintln!("   Mode: console (:back to go back, :quit to exit)\n");
        let catalog = Arc::new(StepCatalog::standard(&config.wizard.admin_email));
        let wizard = Wizard::new(catalog, config.wizard.submission_prefix.clone());
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut console = ConsoleWizard::new(wizard, uploads, forwarder, stdin, std::io::stdout());

        match console.run().await? {
            ConsoleOutcome::Submitted(_) => tracing::info!("Console onboarding submitted"),
            ConsoleOutcome::Quit => eprintln!("Bye."),
            ConsoleOutcome::InputClosed => eprintln!("Input closed before the wizard finished."),
        }
        return Ok(());
    }

    let app = build_router(&config, uploads, forwarder);
    let listener = tokio::net::TcpListener::bind(config.server.bind).await?;
    eprintln!("   Listening: http://{}\n", listener.local_addr()?);
    tracing::info!(addr = %config.server.bind, "Intake server started");
    axum::serve(listener, app).await?;

    Ok(())
}

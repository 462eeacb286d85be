use crate::cli::ImportAction;
use crate::context::CliContext;
use crate::output;
use kanban_import::{HttpFetcher, ImportOptions, TrelloExport, TrelloImporter};
use tokio_util::sync::CancellationToken;

pub async fn handle(ctx: &CliContext, action: ImportAction) -> anyhow::Result<()> {
    let fetcher = HttpFetcher::from_config(&ctx.config)?;
    let importer = TrelloImporter::new(&ctx.store, fetcher, &ctx.config);
    let options = ImportOptions::with_cancel(cancel_on_ctrl_c());

    let report = match action {
        ImportAction::Trello { file } => importer.import_file(&file, &options).await?,
        ImportAction::Attachments { board, file } => {
            let export = TrelloExport::from_file(&file).await?;
            importer.import_attachments(&board, &export, &options).await?
        }
    };

    for failed in report.failed_fetches() {
        tracing::warn!("Could not fetch {} for {}", failed.url, failed.subject);
    }
    output::output_success(&report);
    Ok(())
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; cancelling import");
            trigger.cancel();
        }
    });
    token
}

use crate::cli::BoardAction;
use crate::context::CliContext;
use crate::output;

pub async fn handle(ctx: &CliContext, action: BoardAction) -> anyhow::Result<()> {
    match action {
        BoardAction::Create { title, slug } => {
            let id = ctx.store.create_board(&title, slug.as_deref()).await?;
            let layout = ctx.store.read_layout(&id).await?;
            output::output_success(serde_json::json!({"id": id, "title": layout.title}));
        }
        BoardAction::List => {
            let boards = ctx.store.list_boards().await?;
            output::output_list(boards);
        }
        BoardAction::Show { id } => {
            let board = ctx.store.load_board(&id).await?;
            output::output_success(&board);
        }
        BoardAction::Rename { id, title } => {
            let outcome = ctx.store.rename_board(&id, &title).await?;
            output::output_success(&outcome);
        }
        BoardAction::Delete { id } => {
            ctx.store.delete_board(&id).await?;
            output::output_success(serde_json::json!({"deleted": id}));
        }
    }
    Ok(())
}

use crate::cli::CardAction;
use crate::context::CliContext;
use crate::output;

pub async fn handle(ctx: &CliContext, action: CardAction) -> anyhow::Result<()> {
    match action {
        CardAction::Move { id, from, to } => {
            let outcome = ctx.store.move_card(&id, &from, &to).await?;
            output::output_success(&outcome);
        }
        CardAction::Meta { board, id } => {
            let meta = ctx.store.load_card_meta(&board, &id).await?;
            output::output_success(&meta);
        }
        CardAction::Revision {
            board,
            id,
            text,
            user,
        } => {
            let revision = ctx.store.save_revision(&board, &id, &text, user).await?;
            output::output_success(&revision);
        }
        CardAction::Delete { board, id } => {
            ctx.store.delete_card(&board, &id).await?;
            output::output_success(serde_json::json!({"deleted": id, "board": board}));
        }
    }
    Ok(())
}

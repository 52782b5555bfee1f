use crate::plugin::{CommandSpec, EditorPlugin};

pub(crate) struct HistoryPlugin;

impl EditorPlugin for HistoryPlugin {
    fn id(&self) -> &'static str {
        "history"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("history.undo", "Undo", |txn, _payload| Ok(txn.undo()?.into()))
                .description("Restore the state before the last change.")
                .keywords(["undo", "history"])
                .toolbar_item("undo"),
            CommandSpec::new("history.redo", "Redo", |txn, _payload| Ok(txn.redo()?.into()))
                .description("Reapply the last undone change.")
                .keywords(["redo", "history"])
                .toolbar_item("redo"),
        ]
    }
}

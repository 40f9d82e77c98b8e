use crate::cli::context::Context;
use crate::cli::{KeyArgs, OutputFormat, StoreTarget, output};
use crate::core::errors::Result;
use crate::core::models::search_key::SearchKey;
use crate::core::models::store_scope::StoreScope;

/// Execute the `certstore info` command.
pub fn execute(ctx: &Context, key: &KeyArgs, target: &StoreTarget) -> Result<()> {
    let search = SearchKey::from_options(key.thumbprint.as_deref(), key.subject.as_deref())?;
    let scope = StoreScope::from_machine_flag(target.machine);
    let store = ctx.store_name(target.store.as_deref());

    let record = ctx.service()?.get_info(&search, scope, &store)?;

    match ctx.format {
        OutputFormat::Text => {
            output::fields(&record.fields());
            Ok(())
        }
        OutputFormat::Json => output::json(&record),
    }
}

use crate::cmd::{Context, SchemaArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::print_schema;

pub fn run(_args: SchemaArgs, ctx: &Context) -> CliResult<i32> {
    let schema = ctx.load_schema()?;
    print_schema(&schema, ctx.format);
    Ok(SUCCESS)
}

use clap::Parser;
use itertools::Itertools;
use remote_eval::jtype::JavaType;
use remote_eval::snapshot::fixture::Fixture;
use remote_eval::{
    Evaluated, EvaluationContext, EvaluationError, ExpressionBuilder, Modifier, RemoteProcess,
    TypeKind, Value,
};
use std::path::PathBuf;
use tracing_log::log::debug;

mod literal;
#[cfg(feature = "log-runtime-traces")]
mod telemetry;

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    #[arg(
        short = 's',
        long = "snapshot",
        help = "TOML snapshot of the suspended process (types, objects and the current frame)"
    )]
    pub snapshot: PathBuf,
    #[arg(
        long = "set",
        value_name = "LITERAL",
        allow_hyphen_values = true,
        help = "Assign the literal to the field before printing it \
        (e.g. 42, 2.5f, 'c', true, null or @label for a snapshot object)"
    )]
    pub set: Option<String>,
    #[arg(
        long = "context-type",
        help = "Class whose code is being debugged; overrides the frame's declaring type"
    )]
    pub context_type: Option<String>,
    #[arg(
        long = "no-fallback",
        help = "Disable the direct lookup retried when hierarchy resolution finds nothing"
    )]
    pub no_fallback: bool,
    #[arg(help = "Dotted field path (e.g. this.owner.name, com.example.Config.LIMIT or items.length)")]
    pub expression: String,
}

fn run(args: &Args) -> Result<String, String> {
    let fixture = Fixture::load(&args.snapshot).map_err(|e| e.to_string())?;
    let mut frame = fixture.frame.clone();
    if let Some(context_type) = &args.context_type {
        frame.declaring_type = Some(context_type.replace('.', "/"));
    }
    let mut config = fixture.config;
    if args.no_fallback {
        config.direct_lookup_fallback = false;
    }
    let ctx = EvaluationContext::new(&fixture.process, &frame).with_config(config);

    let tree = ExpressionBuilder::build(&args.expression, &ctx).map_err(|e| e.to_string())?;
    debug!("Evaluating {:?}", tree);
    let mut result = tree.evaluate(&ctx).map_err(|e| e.to_string())?;

    if let Some(text) = &args.set {
        let modifier = result
            .modifier()
            .ok_or_else(|| EvaluationError::NotModifiable(args.expression.clone()).to_string())?;
        let expected = modifier.expected_type(&ctx).map_err(|e| e.to_string())?;
        let value = literal::parse(text, &expected, &fixture)?;
        modifier.set_value(&ctx, value).map_err(|e| e.to_string())?;
        result = tree.evaluate(&ctx).map_err(|e| e.to_string())?;
    }

    render(&fixture, &result.evaluated).map_err(|e| e.to_string())
}

fn render(fixture: &Fixture, evaluated: &Evaluated) -> Result<String, EvaluationError> {
    let process = &fixture.process;
    let obj = match evaluated {
        Evaluated::Type(ty) => return Ok(format!("class {}", display_type_name(fixture, *ty)?)),
        Evaluated::Value(Value::Object(obj)) => *obj,
        Evaluated::Value(value) => return Ok(value.to_string()),
    };
    let ty = process.runtime_type(obj)?;
    let head = format!("{} ({})", short(fixture, Value::Object(obj)), display_type_name(fixture, ty)?);
    if process.type_kind(ty)? != TypeKind::Array {
        return Ok(head);
    }
    let elements = (0..process.array_length(obj)?)
        .map(|idx| process.read_array_element(obj, idx as usize))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!(
        "{} [{}]",
        head,
        elements.into_iter().flatten().map(|v| short(fixture, v)).join(", ")
    ))
}

fn short(fixture: &Fixture, value: Value) -> String {
    match value {
        Value::Object(obj) => fixture
            .label_of(obj)
            .map(|label| format!("@{}", label))
            .unwrap_or_else(|| obj.to_string()),
        other => other.to_string(),
    }
}

fn display_type_name(fixture: &Fixture, ty: remote_eval::TypeId) -> Result<String, EvaluationError> {
    let name = fixture.process.type_name(ty)?;
    if name.starts_with('[') {
        Ok(JavaType::try_from(name.as_str())?.to_string())
    } else {
        Ok(name.replace('/', "."))
    }
}

#[hotpath::main]
fn main() {
    #[cfg(feature = "log-runtime-traces")]
    telemetry::init_tracing();
    let args = Args::parse();
    debug!("Provided command line arguments: {:?}", args);

    match run(&args) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

//! Chronoscene CLI - Tool for inspecting time-dynamic packet feeds.

use std::env;
use std::process::ExitCode;

use chronoscene::prelude::*;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut verbose = false;
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => verbose = true,
            _ => filtered_args.push(arg),
        }
    }
    init_tracing(verbose);

    if filtered_args.is_empty() {
        print_usage();
        return ExitCode::SUCCESS;
    }

    let result = match filtered_args[0] {
        "info" | "i" => with_file(&filtered_args, cmd_info),
        "tree" | "t" => with_file(&filtered_args, cmd_tree),
        "eval" | "e" => {
            if filtered_args.len() < 3 {
                eprintln!("Usage: chronoscene eval <feed.json> <iso-time> [entity-id]");
                return ExitCode::FAILURE;
            }
            with_file(&filtered_args, |doc| {
                cmd_eval(doc, filtered_args[2], filtered_args.get(3).copied())
            })
        }
        "help" | "h" | "-h" | "--help" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::prelude::*;

    let filter = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false));
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: tracing already initialized");
    }
}

fn print_usage() {
    println!("Chronoscene CLI - Inspect time-dynamic packet feeds");
    println!();
    println!("Usage: chronoscene [options] <command> <feed.json> [args]");
    println!();
    println!("Commands:");
    println!("  i, info    Show feed summary (entities, availability, clock)");
    println!("  t, tree    Show the entity parent/child hierarchy");
    println!("  e, eval    Evaluate entity attributes at a time");
    println!("             eval <feed.json> <iso-time> [entity-id]");
    println!("  h, help    Show this help");
    println!();
    println!("Options:");
    println!("  -v, --verbose  Debug output");
}

/// Load the feed file named at argument 1, then run the command.
fn with_file(args: &[&str], run: impl FnOnce(&Document) -> Result<()>) -> Result<()> {
    let Some(path) = args.get(1) else {
        return Err(Error::other("missing file argument"));
    };
    let mut document = Document::new();
    let stats = document.load_file(path)?;
    if !stats.is_clean() {
        eprintln!("Warning: {} packet(s) skipped:", stats.errors.len());
        for err in &stats.errors {
            eprintln!("  {err}");
        }
    }
    run(&document)
}

fn cmd_info(document: &Document) -> Result<()> {
    println!("Document: {}", document.name().unwrap_or("(unnamed)"));
    println!("Entities: {}", document.entities().len());

    let availability = document.entities().compute_availability();
    if availability.is_unbounded() {
        println!("Availability: unbounded");
    } else if let (Some(start), Some(stop)) = (availability.start(), availability.stop()) {
        println!("Availability: {start} to {stop}");
    }

    match document.clock() {
        Some(clock) => {
            let origin = if document.explicit_clock().is_some() {
                "explicit"
            } else {
                "derived"
            };
            println!(
                "Clock ({origin}): {} at {}x",
                clock.interval, clock.multiplier
            );
        }
        None => println!("Clock: none"),
    }

    // Count visual kinds
    let mut counts = [0usize; 6];
    for entity in document.entities().iter() {
        counts[0] += entity.billboard().is_some() as usize;
        counts[1] += entity.label().is_some() as usize;
        counts[2] += entity.point().is_some() as usize;
        counts[3] += entity.path().is_some() as usize;
        counts[4] += entity.polyline().is_some() as usize;
        counts[5] += entity.polygon().is_some() as usize;
    }
    println!();
    println!("Visuals:");
    for (name, count) in ["Billboards", "Labels", "Points", "Paths", "Polylines", "Polygons"]
        .iter()
        .zip(counts)
    {
        if count > 0 {
            println!("  {name}: {count}");
        }
    }
    Ok(())
}

fn cmd_tree(document: &Document) -> Result<()> {
    let entities = document.entities();
    // Roots first, then their children, depth-first
    for entity in entities.iter() {
        if entity.parent_id().is_none() {
            print_subtree(entities, entity, 0);
        }
    }
    // Entities whose parent has not arrived yet
    for entity in entities.iter() {
        if entity.parent_id().is_some() && entities.parent_of(entity).is_none() {
            println!(
                "{} [orphan of '{}']",
                entity.id(),
                entity.parent_id().unwrap_or_default()
            );
        }
    }
    Ok(())
}

fn print_subtree(entities: &EntityCollection, entity: &Entity, depth: usize) {
    let indent = "  ".repeat(depth);
    match entity.name() {
        Some(name) => println!("{indent}{} ({name})", entity.id()),
        None => println!("{indent}{}", entity.id()),
    }
    for child in entities.iter() {
        if child.parent_id() == Some(entity.id()) {
            print_subtree(entities, child, depth + 1);
        }
    }
}

fn cmd_eval(document: &Document, time: &str, id: Option<&str>) -> Result<()> {
    let time = TimeStamp::from_iso8601(time)?;
    let entities = document.entities();

    let targets: Vec<&Entity> = match id {
        Some(id) => match entities.get_by_id(id) {
            Some(entity) => vec![entity],
            None => return Err(Error::other(format!("no entity with id '{id}'"))),
        },
        None => entities.iter().collect(),
    };

    for entity in targets {
        println!("{}:", entity.id());
        println!("  available: {}", entity.is_available(time));
        if let Some(position) = entity.position() {
            print_value("position", position.get_value(time, entities));
        }
        if let Some(orientation) = entity.orientation() {
            print_value("orientation", orientation.get_value(time, entities));
        }
        print_pack_values("billboard", entity.billboard().map(|p| p.fields()), time, entities);
        print_pack_values("label", entity.label().map(|p| p.fields()), time, entities);
        print_pack_values("point", entity.point().map(|p| p.fields()), time, entities);
        print_pack_values("path", entity.path().map(|p| p.fields()), time, entities);
        print_pack_values("polyline", entity.polyline().map(|p| p.fields()), time, entities);
        print_pack_values("polygon", entity.polygon().map(|p| p.fields()), time, entities);
    }
    Ok(())
}

fn print_value(name: &str, value: Option<Value>) {
    match value {
        Some(v) => println!("  {name}: {v:?}"),
        None => println!("  {name}: undefined"),
    }
}

fn print_pack_values(
    pack: &str,
    fields: Option<Vec<(&'static str, &Property)>>,
    time: TimeStamp,
    entities: &EntityCollection,
) {
    let Some(fields) = fields else { return };
    for (field, property) in fields {
        print_value(&format!("{pack}.{field}"), property.get_value(time, entities));
    }
}

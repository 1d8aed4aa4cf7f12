use crate::error::CliError;
use engine_runtime::commands::FetchValueResponse;
use model::{
    core::{location::Location, object::CONTENT_TYPE_JSON},
    pagination::continuation::Continuation,
    records::chunk::IndexEntry,
};
use serde_json::json;

pub fn print_fetch(
    location: &Location,
    response: Option<&FetchValueResponse>,
    as_json: bool,
) -> Result<(), CliError> {
    let Some(response) = response else {
        if as_json {
            println!("{}", json!({ "location": location, "found": false }));
        } else {
            println!("{location}: not found");
        }
        return Ok(());
    };

    let object = &response.object;
    let value = if object.content_type == CONTENT_TYPE_JSON {
        response.value::<serde_json::Value>()?
    } else {
        serde_json::Value::String(String::from_utf8_lossy(&object.value).into_owned())
    };

    if as_json {
        let doc = json!({
            "location": response.location,
            "found": true,
            "content_type": object.content_type,
            "indexes": object.indexes,
            "value": value,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!("{} ({})", response.location, object.content_type);
        for (index, terms) in &object.indexes {
            let terms: Vec<String> = terms.iter().map(ToString::to_string).collect();
            println!("  {index}: {}", terms.join(", "));
        }
        println!("{value}");
    }
    Ok(())
}

pub fn print_entry(entry: &IndexEntry, as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", serde_json::to_string(entry)?);
    } else {
        match &entry.term {
            Some(term) => println!("{}\t{}", term, entry.object_key),
            None => println!("{}", entry.object_key),
        }
    }
    Ok(())
}

pub fn print_key(key: &str, as_json: bool) {
    if as_json {
        println!("{}", json!({ "key": key }));
    } else {
        println!("{key}");
    }
}

pub fn print_continuation(continuation: &Continuation, as_json: bool) {
    if as_json {
        println!("{}", json!({ "continuation": continuation.to_hex() }));
    } else {
        println!("continuation: {continuation}");
    }
}

//! Rhai registration for the script-visible objects.
//!
//! Scripts interact with three types: the request facade (`request`), the
//! abort signal (`response`) and the logger (`logger`). Only the operations
//! registered here are reachable from a script; everything else on the
//! underlying request stays out of the sandbox.
//!
//! `set_header` and `set_query_param` are registered for one to four
//! inline values plus an array form, mirroring a varargs surface.

use http::StatusCode;
use rhai::{Array, Dynamic, Engine, EvalAltResult, Map as RhaiMap, Position};
use serde_json::Value;

use super::{AbortSignal, ScriptLogger};
use crate::error::AbortFault;
use crate::request::RequestFacade;

pub(crate) fn register(engine: &mut Engine) {
    engine.register_type_with_name::<RequestFacade>("Request");
    engine.register_type_with_name::<AbortSignal>("Response");
    engine.register_type_with_name::<ScriptLogger>("Logger");

    register_header_api(engine);
    register_query_api(engine);
    register_claims_api(engine);
    register_abort_api(engine);
    register_logger_api(engine);
}

fn register_header_api(engine: &mut Engine) {
    engine.register_fn("get_headers", |req: &mut RequestFacade| -> RhaiMap {
        multimap(req.headers())
    });
    engine.register_fn(
        "get_header",
        |req: &mut RequestFacade, name: &str| -> Dynamic { optional_values(req.header(name)) },
    );
    engine.register_fn(
        "get_first_header",
        |req: &mut RequestFacade, name: &str| -> Dynamic {
            optional_string(req.first_header(name))
        },
    );

    engine.register_fn("set_header", |req: &mut RequestFacade, name: &str, v1: &str| {
        set_header(req, name, vec![v1.to_owned()])
    });
    engine.register_fn(
        "set_header",
        |req: &mut RequestFacade, name: &str, v1: &str, v2: &str| {
            set_header(req, name, vec![v1.to_owned(), v2.to_owned()])
        },
    );
    engine.register_fn(
        "set_header",
        |req: &mut RequestFacade, name: &str, v1: &str, v2: &str, v3: &str| {
            set_header(req, name, vec![v1.to_owned(), v2.to_owned(), v3.to_owned()])
        },
    );
    engine.register_fn(
        "set_header",
        |req: &mut RequestFacade, name: &str, v1: &str, v2: &str, v3: &str, v4: &str| {
            set_header(
                req,
                name,
                vec![v1.to_owned(), v2.to_owned(), v3.to_owned(), v4.to_owned()],
            )
        },
    );
    engine.register_fn(
        "set_header",
        |req: &mut RequestFacade, name: &str, values: Array| {
            set_header(req, name, render_all(&values))
        },
    );

    engine.register_fn("remove_header", |req: &mut RequestFacade, name: &str| {
        req.remove_header(name)
    });
}

fn register_query_api(engine: &mut Engine) {
    engine.register_fn("get_query_params", |req: &mut RequestFacade| -> RhaiMap {
        multimap(req.query_params())
    });
    engine.register_fn(
        "get_query_param",
        |req: &mut RequestFacade, name: &str| -> Dynamic {
            optional_values(req.query_param(name))
        },
    );
    engine.register_fn(
        "get_first_query_param",
        |req: &mut RequestFacade, name: &str| -> Dynamic {
            optional_string(req.first_query_param(name))
        },
    );

    engine.register_fn(
        "set_query_param",
        |req: &mut RequestFacade, name: &str, v1: Dynamic| {
            set_query_param(req, name, vec![render(&v1)])
        },
    );
    engine.register_fn(
        "set_query_param",
        |req: &mut RequestFacade, name: &str, v1: Dynamic, v2: Dynamic| {
            set_query_param(req, name, vec![render(&v1), render(&v2)])
        },
    );
    engine.register_fn(
        "set_query_param",
        |req: &mut RequestFacade, name: &str, v1: Dynamic, v2: Dynamic, v3: Dynamic| {
            set_query_param(req, name, vec![render(&v1), render(&v2), render(&v3)])
        },
    );
    engine.register_fn(
        "set_query_param",
        |req: &mut RequestFacade,
         name: &str,
         v1: Dynamic,
         v2: Dynamic,
         v3: Dynamic,
         v4: Dynamic| {
            set_query_param(
                req,
                name,
                vec![render(&v1), render(&v2), render(&v3), render(&v4)],
            )
        },
    );
    engine.register_fn(
        "set_query_param",
        |req: &mut RequestFacade, name: &str, values: Array| {
            set_query_param(req, name, render_all(&values))
        },
    );

    engine.register_fn("remove_query_param", |req: &mut RequestFacade, name: &str| {
        req.remove_query_param(name)
    });
}

fn register_claims_api(engine: &mut Engine) {
    engine.register_fn(
        "get_claims",
        |req: &mut RequestFacade| -> Result<Dynamic, Box<EvalAltResult>> {
            rhai::serde::to_dynamic(Value::Object(req.claims()))
        },
    );
    engine.register_fn(
        "get_claim",
        |req: &mut RequestFacade, path: &str| -> Result<Dynamic, Box<EvalAltResult>> {
            match req.claim(path) {
                Some(value) => rhai::serde::to_dynamic(value),
                None => Ok(Dynamic::UNIT),
            }
        },
    );
}

fn register_abort_api(engine: &mut Engine) {
    engine.register_fn(
        "consume",
        |_resp: &mut AbortSignal, code: i64, reason: &str| -> Result<(), Box<EvalAltResult>> {
            if !(100..=599).contains(&code) {
                return Err(runtime_error(format!(
                    "abort status code out of range: {code}"
                )));
            }
            let status = StatusCode::from_u16(code as u16)
                .map_err(|_| runtime_error(format!("invalid abort status code: {code}")))?;
            Err(EvalAltResult::ErrorRuntime(
                Dynamic::from(AbortFault {
                    status,
                    reason: reason.to_owned(),
                }),
                Position::NONE,
            )
            .into())
        },
    );
}

fn register_logger_api(engine: &mut Engine) {
    engine.register_fn("info", |log: &mut ScriptLogger, msg: &str| log.info(msg));
    engine.register_fn("debug", |log: &mut ScriptLogger, msg: &str| log.debug(msg));
    engine.register_fn("warn", |log: &mut ScriptLogger, msg: &str| log.warn(msg));
    engine.register_fn("error", |log: &mut ScriptLogger, msg: &str| log.error(msg));

    engine.register_fn("info", |log: &mut ScriptLogger, msg: &str, detail: Dynamic| {
        log.info_with(msg, &render(&detail))
    });
    engine.register_fn("debug", |log: &mut ScriptLogger, msg: &str, detail: Dynamic| {
        log.debug_with(msg, &render(&detail))
    });
    engine.register_fn("warn", |log: &mut ScriptLogger, msg: &str, detail: Dynamic| {
        log.warn_with(msg, &render(&detail))
    });
    engine.register_fn("error", |log: &mut ScriptLogger, msg: &str, detail: Dynamic| {
        log.error_with(msg, &render(&detail))
    });
}

fn set_header(
    req: &RequestFacade,
    name: &str,
    values: Vec<String>,
) -> Result<(), Box<EvalAltResult>> {
    req.set_header(name, &values).map_err(runtime_error)
}

fn set_query_param(
    req: &RequestFacade,
    name: &str,
    values: Vec<String>,
) -> Result<(), Box<EvalAltResult>> {
    req.set_query_param(name, &values).map_err(runtime_error)
}

/// Canonical textual rendering for script values handed to the request:
/// strings as-is, integers in decimal, booleans as `true`/`false`.
fn render(value: &Dynamic) -> String {
    value.to_string()
}

fn render_all(values: &Array) -> Vec<String> {
    values.iter().map(render).collect()
}

fn multimap(entries: Vec<(String, Vec<String>)>) -> RhaiMap {
    let mut map = RhaiMap::new();
    for (name, values) in entries {
        let array: Array = values.into_iter().map(Dynamic::from).collect();
        map.insert(name.into(), array.into());
    }
    map
}

fn optional_values(values: Option<Vec<String>>) -> Dynamic {
    match values {
        Some(values) => Dynamic::from(values.into_iter().map(Dynamic::from).collect::<Array>()),
        None => Dynamic::UNIT,
    }
}

fn optional_string(value: Option<String>) -> Dynamic {
    value.map_or(Dynamic::UNIT, Dynamic::from)
}

fn runtime_error(err: impl ToString) -> Box<EvalAltResult> {
    EvalAltResult::ErrorRuntime(Dynamic::from(err.to_string()), Position::NONE).into()
}

//! A tiny line-oriented recording script, interpreted one line at a time into
//! [`genlower::generator::CodeGenerator`] calls. Not a real parser — blank lines and lines
//! starting with `#` are skipped, everything else is `command arg...` split on whitespace.
use std::collections::HashMap;

use genlower::generator::CodeGenerator;
use genlower::label::Label;
use genlower::node::OutputExpr;
use genlower::symbols::ParameterFlags;

use crate::Frag;

fn frag(text: &str) -> OutputExpr<Frag> {
    OutputExpr::Source(Frag(text.to_string()))
}

fn maybe_frag(text: &str) -> Option<OutputExpr<Frag>> {
    if text.is_empty() {
        None
    } else {
        Some(frag(text))
    }
}

pub fn run(script: &str, generator: &mut CodeGenerator<Frag>) -> Result<(), String> {
    let mut labels: HashMap<String, Label> = HashMap::new();

    for (line_no, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or("");
        let rest = parts.next().unwrap_or("").trim();

        run_command(command, rest, generator, &mut labels)
            .map_err(|err| format!("line {}: {}", line_no + 1, err))?;
    }
    Ok(())
}

fn lookup<'a>(labels: &'a HashMap<String, Label>, name: &str) -> Result<Label, String> {
    labels
        .get(name)
        .copied()
        .ok_or_else(|| format!("undefined label {:?}", name))
}

fn run_command(
    command: &str,
    rest: &str,
    generator: &mut CodeGenerator<Frag>,
    labels: &mut HashMap<String, Label>,
) -> Result<(), String> {
    match command {
        "stmt" => generator.emit_node(Frag(rest.to_string())),
        "yield" => generator.emit_yield(maybe_frag(rest)),
        "return" => generator.emit_return(maybe_frag(rest)),
        "throw" => generator.emit_throw(frag(rest)),
        "endfinally" => generator.emit_endfinally(),

        "param" => generator.add_parameter(rest.to_string(), ParameterFlags::default()),
        "local" => {
            generator.declare_local(Some(rest.to_string()));
        }

        "label" => {
            let label = generator.define_label();
            labels.insert(rest.to_string(), label);
        }
        "mark" => generator.mark_label(lookup(labels, rest)?),
        "break" => generator.emit_break(lookup(labels, rest)?),

        "brtrue" | "brfalse" => {
            let mut parts = rest.splitn(2, char::is_whitespace);
            let name = parts.next().unwrap_or("");
            let cond = parts.next().unwrap_or("").trim();
            let label = lookup(labels, name)?;
            if command == "brtrue" {
                generator.emit_br_true(label, frag(cond));
            } else {
                generator.emit_br_false(label, frag(cond));
            }
        }

        "beginbreak" => {
            let mut parts = rest.splitn(2, char::is_whitespace);
            let name = parts.next().unwrap_or("").to_string();
            let label_text = parts.next().map(str::trim).and_then(|s| maybe_text(s));
            if name.is_empty() {
                return Err("beginbreak requires a name to bind the break label to".to_string());
            }
            let label = generator.begin_break_block(label_text);
            labels.insert(name, label);
        }
        "endbreak" => generator.end_break_block(),

        "begintry" => {
            let end_label = generator.begin_exception_block();
            if !rest.is_empty() {
                labels.insert(rest.to_string(), end_label);
            }
        }
        "begincatch" => {
            generator.begin_catch_block(maybe_text(rest));
        }
        "beginfinally" => {
            generator.begin_finally_block();
        }
        "endtry" => generator.end_exception_block(),

        other => return Err(format!("unknown command {:?}", other)),
    }
    Ok(())
}

fn maybe_text(rest: &str) -> Option<String> {
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

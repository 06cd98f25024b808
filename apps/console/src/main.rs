//! Terminal front-end for the action workflow: renders forms and outcomes,
//! maps keys to workflow commands, and drives submits against the remote
//! action service.

use std::{path::Path, sync::Arc, thread};

use anyhow::Result;
use clap::Parser;
use client_core::{
    workflow::{
        InstanceId, KeyCommand, PresentationSurface, WorkflowController, WorkflowInstance,
        WorkflowPhase,
    },
    ActionService, HttpActionService, SubmitError,
};
use serde_json::Value;
use shared::domain::{FieldKind, FormSubmission};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8090")]
    server_url: String,
}

enum LoopEvent {
    Input(String),
    Completed {
        instance: InstanceId,
        outcome: Result<Value, SubmitError>,
    },
    Shutdown,
}

struct ConsoleSurface;

impl PresentationSurface for ConsoleSurface {
    fn render(&mut self, instance: &WorkflowInstance) {
        match instance.phase() {
            WorkflowPhase::FormVisible => {
                let schema = instance.action().form_schema();
                println!("== {} ==", schema.title);
                for field in schema.fields {
                    let marker = if field.required { "required" } else { "optional" };
                    let hint = match field.kind {
                        FieldKind::File => " (set <field> <path>)",
                        _ => "",
                    };
                    println!("  {} - {} [{marker}]{hint}", field.name, field.label);
                }
                println!("fill with 'set <field> <value>', then 'submit'");
            }
            WorkflowPhase::Submitting => {
                println!("submitting to /{} ...", instance.action().endpoint());
            }
            WorkflowPhase::Success(result) => {
                println!("success:");
                match serde_json::to_string_pretty(result) {
                    Ok(pretty) => println!("{pretty}"),
                    Err(_) => println!("{result}"),
                }
                println!("'retry' opens a fresh form, 'q' closes");
            }
            WorkflowPhase::Error(message) => {
                println!("error: {message}");
                println!("'retry' opens a fresh form, 'q' closes");
            }
        }
    }

    fn clear(&mut self) {
        println!("workflow closed");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let service = Arc::new(HttpActionService::new(args.server_url));
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    spawn_stdin_reader(events_tx.clone());

    let mut controller = WorkflowController::new(ConsoleSurface);
    let mut draft = FormSubmission::new();

    println!("actions: 1) create file  2) upload file  3) analyze code  4) optimize code");
    println!("'q' closes the open workflow, ctrl-d exits");

    while let Some(event) = events_rx.recv().await {
        match event {
            LoopEvent::Input(line) => {
                handle_input(
                    &mut controller,
                    &mut draft,
                    &service,
                    &events_tx,
                    line.trim(),
                );
            }
            LoopEvent::Completed { instance, outcome } => {
                controller.complete_submit(instance, outcome);
            }
            LoopEvent::Shutdown => break,
        }
    }
    Ok(())
}

fn spawn_stdin_reader(events_tx: mpsc::UnboundedSender<LoopEvent>) {
    thread::spawn(move || {
        use std::io::BufRead;
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if events_tx.send(LoopEvent::Input(line)).is_err() {
                return;
            }
        }
        let _ = events_tx.send(LoopEvent::Shutdown);
    });
}

fn handle_input(
    controller: &mut WorkflowController<ConsoleSurface>,
    draft: &mut FormSubmission,
    service: &Arc<HttpActionService>,
    events_tx: &mpsc::UnboundedSender<LoopEvent>,
    line: &str,
) {
    if line.is_empty() {
        return;
    }

    if let Some(command) = single_key_command(line) {
        *draft = FormSubmission::new();
        match command {
            KeyCommand::Trigger(action) => {
                controller.trigger(action);
            }
            KeyCommand::Dismiss => controller.dismiss(),
        }
        return;
    }

    match line.split_whitespace().next() {
        Some("set") => set_field(controller, draft, line),
        Some("submit") => submit_draft(controller, draft, service, events_tx),
        Some("retry") => {
            *draft = FormSubmission::new();
            if let Err(error) = controller.reset() {
                println!("{error}");
            }
        }
        _ => println!("unrecognized input: {line}"),
    }
}

fn single_key_command(line: &str) -> Option<KeyCommand> {
    if line == "q" {
        return Some(KeyCommand::Dismiss);
    }
    let mut chars = line.chars();
    let key = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    KeyCommand::from_key(key)
}

fn set_field(
    controller: &WorkflowController<ConsoleSurface>,
    draft: &mut FormSubmission,
    line: &str,
) {
    let Some(instance) = controller.instance() else {
        println!("no form is open; pick an action first");
        return;
    };

    let mut parts = line.splitn(3, char::is_whitespace);
    parts.next();
    let (Some(name), Some(value)) = (parts.next(), parts.next()) else {
        println!("usage: set <field> <value>");
        return;
    };

    let schema = instance.action().form_schema();
    let Some(field) = schema.fields.iter().find(|field| field.name == name) else {
        println!("unknown field '{name}' for {}", schema.title);
        return;
    };

    match field.kind {
        FieldKind::File => match std::fs::read(value) {
            Ok(bytes) => {
                let filename = Path::new(value)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| value.to_string());
                draft.insert_file(field.name, filename, bytes);
                println!("attached {value}");
            }
            Err(error) => println!("cannot read {value}: {error}"),
        },
        _ => {
            draft.insert_text(field.name, value);
            println!("{} = {value}", field.name);
        }
    }
}

fn submit_draft(
    controller: &mut WorkflowController<ConsoleSurface>,
    draft: &mut FormSubmission,
    service: &Arc<HttpActionService>,
    events_tx: &mpsc::UnboundedSender<LoopEvent>,
) {
    let Some(instance) = controller.instance() else {
        println!("no form is open; pick an action first");
        return;
    };

    // Required fields are enforced here, before the controller sees the
    // submission; the controller forwards whatever it is given.
    let schema = instance.action().form_schema();
    let missing: Vec<&str> = schema
        .fields
        .iter()
        .filter(|field| field.required && draft.get(field.name).is_none())
        .map(|field| field.name)
        .collect();
    if !missing.is_empty() {
        println!("missing required fields: {}", missing.join(", "));
        return;
    }

    let submission = std::mem::take(draft);
    match controller.begin_submit(submission) {
        Ok(ticket) => {
            let service = Arc::clone(service);
            let events_tx = events_tx.clone();
            tokio::spawn(async move {
                let outcome = service.submit(ticket.action, ticket.submission).await;
                let _ = events_tx.send(LoopEvent::Completed {
                    instance: ticket.instance,
                    outcome,
                });
            });
        }
        Err(error) => println!("{error}"),
    }
}

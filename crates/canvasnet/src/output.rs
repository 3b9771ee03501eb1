use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use canvasnet_message::{Body, Message};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    ctx: u8,
    #[serde(rename = "type")]
    kind: &'a str,
    tag: u8,
    stream: &'a str,
    payload_length: usize,
    summary: String,
    timestamp: String,
}

pub fn print_message(message: &Message, format: OutputFormat) {
    let kind = message.message_type();
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                ctx: message.context_id(),
                kind: kind.name(),
                tag: kind.as_u8(),
                stream: message.stream().name(),
                payload_length: message.payload_length(),
                summary: summary(message.body()),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CTX", "TYPE", "STREAM", "SIZE", "SUMMARY"])
                .add_row(vec![
                    message.context_id().to_string(),
                    kind.name().to_string(),
                    message.stream().name().to_string(),
                    message.payload_length().to_string(),
                    summary(message.body()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "ctx={} type={} ({}) stream={} size={} {}",
                message.context_id(),
                kind.name(),
                kind.as_u8(),
                message.stream(),
                message.payload_length(),
                summary(message.body())
            );
        }
        OutputFormat::Raw => match message.to_bytes() {
            Ok(wire) => print_raw(&wire),
            Err(err) => tracing::warn!(error = %err, "message not re-encodable"),
        },
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// One-line description of a payload for humans.
pub fn summary(body: &Body) -> String {
    match body {
        Body::Login(login) => login.message.clone(),
        Body::UserJoin(join) => join.name.clone(),
        Body::UserAttr(attr) => format!("attrs={:#04x}", attr.attrs),
        Body::UserLeave | Body::PenUp | Body::UndoPoint => String::new(),
        Body::Chat(chat) => chat.text.clone(),
        Body::LayerAcl(acl) => format!(
            "layer={} locked={} exclusive={:?}",
            acl.layer, acl.locked, acl.exclusive
        ),
        Body::Snapshot(snapshot) => format!("mode={}", snapshot.mode),
        Body::SessionTitle(title) => title.title.clone(),
        Body::SessionConfig(config) => format!(
            "max_users={} flags={:#06x}",
            config.max_users, config.flags
        ),
        Body::StreamPos(pos) => format!("position={}", pos.position),
        Body::CanvasResize(resize) => format!(
            "top={} right={} bottom={} left={}",
            resize.top, resize.right, resize.bottom, resize.left
        ),
        Body::LayerCreate(layer) => format!(
            "id={} fill={:#010x} title={}",
            layer.id, layer.fill, layer.title
        ),
        Body::LayerAttributes(attrs) => format!(
            "id={} opacity={} blend={}",
            attrs.id, attrs.opacity, attrs.blend
        ),
        Body::LayerRetitle(layer) => format!("id={} title={}", layer.id, layer.title),
        Body::LayerOrder(order) => format!("order={:?}", order.order),
        Body::LayerDelete(layer) => format!("id={} merge={}", layer.id, layer.merge),
        Body::PutImage(image) => format!(
            "layer={} at {},{} {}x{} ({} bytes)",
            image.layer,
            image.x,
            image.y,
            image.width,
            image.height,
            image.image.len()
        ),
        Body::ToolChange(tool) => format!(
            "layer={} blend={} color={:#010x}",
            tool.layer, tool.blend, tool.color_high
        ),
        Body::PenMove(pen) => format!("{} points", pen.points.len()),
        Body::AnnotationCreate(annotation) => {
            let rect = &annotation.0;
            format!(
                "id={} at {},{} {}x{}",
                rect.id, rect.x, rect.y, rect.width, rect.height
            )
        }
        Body::AnnotationReshape(annotation) => {
            let rect = &annotation.0;
            format!(
                "id={} to {},{} {}x{}",
                rect.id, rect.x, rect.y, rect.width, rect.height
            )
        }
        Body::AnnotationEdit(edit) => format!("id={} text={}", edit.id, edit.text),
        Body::AnnotationDelete(annotation) => format!("id={}", annotation.id),
        Body::Undo(undo) => format!(
            "override_user={} points={}",
            undo.override_user, undo.points
        ),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

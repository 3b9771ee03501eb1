use bytes::{Bytes, BytesMut};

use crate::codec::{self, HEADER_SIZE};
use crate::error::{MessageError, Result};
use crate::kind::{MessageType, Stream};
use crate::payload::{
    AnnotationCreate, AnnotationDelete, AnnotationEdit, AnnotationReshape, CanvasResize, Chat,
    Fields, LayerAcl, LayerAttributes, LayerCreate, LayerDelete, LayerOrder, LayerRetitle, Login,
    Payload, PenMove, PutImage, SessionConfig, SessionTitle, SnapshotMode, StreamPos, ToolChange,
    Undo, UserAttr, UserJoin,
};

/// Decoded body of a message, one variant per message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Login(Login),
    UserJoin(UserJoin),
    UserAttr(UserAttr),
    UserLeave,
    Chat(Chat),
    LayerAcl(LayerAcl),
    Snapshot(SnapshotMode),
    SessionTitle(SessionTitle),
    SessionConfig(SessionConfig),
    StreamPos(StreamPos),
    CanvasResize(CanvasResize),
    LayerCreate(LayerCreate),
    LayerAttributes(LayerAttributes),
    LayerRetitle(LayerRetitle),
    LayerOrder(LayerOrder),
    LayerDelete(LayerDelete),
    PutImage(PutImage),
    ToolChange(ToolChange),
    PenMove(PenMove),
    PenUp,
    AnnotationCreate(AnnotationCreate),
    AnnotationReshape(AnnotationReshape),
    AnnotationEdit(AnnotationEdit),
    AnnotationDelete(AnnotationDelete),
    UndoPoint,
    Undo(Undo),
}

impl Body {
    pub fn message_type(&self) -> MessageType {
        match self {
            Body::Login(_) => MessageType::Login,
            Body::UserJoin(_) => MessageType::UserJoin,
            Body::UserAttr(_) => MessageType::UserAttr,
            Body::UserLeave => MessageType::UserLeave,
            Body::Chat(_) => MessageType::Chat,
            Body::LayerAcl(_) => MessageType::LayerAcl,
            Body::Snapshot(_) => MessageType::Snapshot,
            Body::SessionTitle(_) => MessageType::SessionTitle,
            Body::SessionConfig(_) => MessageType::SessionConfig,
            Body::StreamPos(_) => MessageType::StreamPos,
            Body::CanvasResize(_) => MessageType::CanvasResize,
            Body::LayerCreate(_) => MessageType::LayerCreate,
            Body::LayerAttributes(_) => MessageType::LayerAttributes,
            Body::LayerRetitle(_) => MessageType::LayerRetitle,
            Body::LayerOrder(_) => MessageType::LayerOrder,
            Body::LayerDelete(_) => MessageType::LayerDelete,
            Body::PutImage(_) => MessageType::PutImage,
            Body::ToolChange(_) => MessageType::ToolChange,
            Body::PenMove(_) => MessageType::PenMove,
            Body::PenUp => MessageType::PenUp,
            Body::AnnotationCreate(_) => MessageType::AnnotationCreate,
            Body::AnnotationReshape(_) => MessageType::AnnotationReshape,
            Body::AnnotationEdit(_) => MessageType::AnnotationEdit,
            Body::AnnotationDelete(_) => MessageType::AnnotationDelete,
            Body::UndoPoint => MessageType::UndoPoint,
            Body::Undo(_) => MessageType::Undo,
        }
    }

    pub(crate) fn body_len(&self) -> usize {
        match self {
            Body::Login(p) => p.body_len(),
            Body::UserJoin(p) => p.body_len(),
            Body::UserAttr(p) => p.body_len(),
            Body::Chat(p) => p.body_len(),
            Body::LayerAcl(p) => p.body_len(),
            Body::Snapshot(p) => p.body_len(),
            Body::SessionTitle(p) => p.body_len(),
            Body::SessionConfig(p) => p.body_len(),
            Body::StreamPos(p) => p.body_len(),
            Body::CanvasResize(p) => p.body_len(),
            Body::LayerCreate(p) => p.body_len(),
            Body::LayerAttributes(p) => p.body_len(),
            Body::LayerRetitle(p) => p.body_len(),
            Body::LayerOrder(p) => p.body_len(),
            Body::LayerDelete(p) => p.body_len(),
            Body::PutImage(p) => p.body_len(),
            Body::ToolChange(p) => p.body_len(),
            Body::PenMove(p) => p.body_len(),
            Body::AnnotationCreate(p) => p.body_len(),
            Body::AnnotationReshape(p) => p.body_len(),
            Body::AnnotationEdit(p) => p.body_len(),
            Body::AnnotationDelete(p) => p.body_len(),
            Body::Undo(p) => p.body_len(),
            Body::UserLeave | Body::PenUp | Body::UndoPoint => 0,
        }
    }

    pub(crate) fn write_body(&self, dst: &mut BytesMut) {
        match self {
            Body::Login(p) => p.write_body(dst),
            Body::UserJoin(p) => p.write_body(dst),
            Body::UserAttr(p) => p.write_body(dst),
            Body::Chat(p) => p.write_body(dst),
            Body::LayerAcl(p) => p.write_body(dst),
            Body::Snapshot(p) => p.write_body(dst),
            Body::SessionTitle(p) => p.write_body(dst),
            Body::SessionConfig(p) => p.write_body(dst),
            Body::StreamPos(p) => p.write_body(dst),
            Body::CanvasResize(p) => p.write_body(dst),
            Body::LayerCreate(p) => p.write_body(dst),
            Body::LayerAttributes(p) => p.write_body(dst),
            Body::LayerRetitle(p) => p.write_body(dst),
            Body::LayerOrder(p) => p.write_body(dst),
            Body::LayerDelete(p) => p.write_body(dst),
            Body::PutImage(p) => p.write_body(dst),
            Body::ToolChange(p) => p.write_body(dst),
            Body::PenMove(p) => p.write_body(dst),
            Body::AnnotationCreate(p) => p.write_body(dst),
            Body::AnnotationReshape(p) => p.write_body(dst),
            Body::AnnotationEdit(p) => p.write_body(dst),
            Body::AnnotationDelete(p) => p.write_body(dst),
            Body::Undo(p) => p.write_body(dst),
            Body::UserLeave | Body::PenUp | Body::UndoPoint => {}
        }
    }

    /// Decode a body of the given type. The whole slice must be consumed.
    pub(crate) fn read(kind: MessageType, body: &[u8]) -> Result<Self> {
        let mut fields = Fields::new(body);
        let decoded = match kind {
            MessageType::Login => Login::read_body(&mut fields).map(Body::Login),
            MessageType::UserJoin => UserJoin::read_body(&mut fields).map(Body::UserJoin),
            MessageType::UserAttr => UserAttr::read_body(&mut fields).map(Body::UserAttr),
            MessageType::UserLeave => Ok(Body::UserLeave),
            MessageType::Chat => Chat::read_body(&mut fields).map(Body::Chat),
            MessageType::LayerAcl => LayerAcl::read_body(&mut fields).map(Body::LayerAcl),
            MessageType::Snapshot => SnapshotMode::read_body(&mut fields).map(Body::Snapshot),
            MessageType::SessionTitle => {
                SessionTitle::read_body(&mut fields).map(Body::SessionTitle)
            }
            MessageType::SessionConfig => {
                SessionConfig::read_body(&mut fields).map(Body::SessionConfig)
            }
            MessageType::StreamPos => StreamPos::read_body(&mut fields).map(Body::StreamPos),
            MessageType::CanvasResize => {
                CanvasResize::read_body(&mut fields).map(Body::CanvasResize)
            }
            MessageType::LayerCreate => LayerCreate::read_body(&mut fields).map(Body::LayerCreate),
            MessageType::LayerAttributes => {
                LayerAttributes::read_body(&mut fields).map(Body::LayerAttributes)
            }
            MessageType::LayerRetitle => {
                LayerRetitle::read_body(&mut fields).map(Body::LayerRetitle)
            }
            MessageType::LayerOrder => LayerOrder::read_body(&mut fields).map(Body::LayerOrder),
            MessageType::LayerDelete => LayerDelete::read_body(&mut fields).map(Body::LayerDelete),
            MessageType::PutImage => PutImage::read_body(&mut fields).map(Body::PutImage),
            MessageType::ToolChange => ToolChange::read_body(&mut fields).map(Body::ToolChange),
            MessageType::PenMove => PenMove::read_body(&mut fields).map(Body::PenMove),
            MessageType::PenUp => Ok(Body::PenUp),
            MessageType::AnnotationCreate => {
                AnnotationCreate::read_body(&mut fields).map(Body::AnnotationCreate)
            }
            MessageType::AnnotationReshape => {
                AnnotationReshape::read_body(&mut fields).map(Body::AnnotationReshape)
            }
            MessageType::AnnotationEdit => {
                AnnotationEdit::read_body(&mut fields).map(Body::AnnotationEdit)
            }
            MessageType::AnnotationDelete => {
                AnnotationDelete::read_body(&mut fields).map(Body::AnnotationDelete)
            }
            MessageType::UndoPoint => Ok(Body::UndoPoint),
            MessageType::Undo => Undo::read_body(&mut fields).map(Body::Undo),
        };

        decoded
            .and_then(|body| fields.finish().map(|()| body))
            .map_err(|reason| MessageError::InvalidPayload {
                message_type: kind,
                reason,
            })
    }
}

macro_rules! body_from_payload {
    ($($payload:ident => $variant:ident),+ $(,)?) => {
        $(
            impl From<$payload> for Body {
                fn from(payload: $payload) -> Self {
                    Body::$variant(payload)
                }
            }
        )+
    };
}

body_from_payload! {
    Login => Login,
    UserJoin => UserJoin,
    UserAttr => UserAttr,
    Chat => Chat,
    LayerAcl => LayerAcl,
    SnapshotMode => Snapshot,
    SessionTitle => SessionTitle,
    SessionConfig => SessionConfig,
    StreamPos => StreamPos,
    CanvasResize => CanvasResize,
    LayerCreate => LayerCreate,
    LayerAttributes => LayerAttributes,
    LayerRetitle => LayerRetitle,
    LayerOrder => LayerOrder,
    LayerDelete => LayerDelete,
    PutImage => PutImage,
    ToolChange => ToolChange,
    PenMove => PenMove,
    AnnotationCreate => AnnotationCreate,
    AnnotationReshape => AnnotationReshape,
    AnnotationEdit => AnnotationEdit,
    AnnotationDelete => AnnotationDelete,
    Undo => Undo,
}

/// A protocol message: originating context id plus a typed body.
///
/// The context id is the first payload byte on the wire. Clients send 0 and
/// the server stamps the sender's id before relaying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    ctx: u8,
    body: Body,
}

impl Message {
    pub fn new(ctx: u8, body: impl Into<Body>) -> Self {
        Self {
            ctx,
            body: body.into(),
        }
    }

    pub fn login(ctx: u8, message: impl Into<String>) -> Self {
        Self::new(
            ctx,
            Login {
                message: message.into(),
            },
        )
    }

    pub fn user_join(ctx: u8, name: impl Into<String>) -> Self {
        Self::new(ctx, UserJoin { name: name.into() })
    }

    pub fn user_leave(ctx: u8) -> Self {
        Self::new(ctx, Body::UserLeave)
    }

    pub fn chat(ctx: u8, text: impl Into<String>) -> Self {
        Self::new(
            ctx,
            Chat {
                flags: 0,
                text: text.into(),
            },
        )
    }

    pub fn undo_point(ctx: u8) -> Self {
        Self::new(ctx, Body::UndoPoint)
    }

    pub fn message_type(&self) -> MessageType {
        self.body.message_type()
    }

    pub fn context_id(&self) -> u8 {
        self.ctx
    }

    pub fn set_context_id(&mut self, ctx: u8) {
        self.ctx = ctx;
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn into_body(self) -> Body {
        self.body
    }

    pub fn stream(&self) -> Stream {
        self.message_type().stream()
    }

    pub fn is_command(&self) -> bool {
        self.message_type().is_command()
    }

    /// Whether an undo can retract this message.
    ///
    /// Every command except `Undo` itself; redo goes through a negative
    /// `Undo` instead.
    pub fn is_undoable(&self) -> bool {
        self.is_command() && self.message_type() != MessageType::Undo
    }

    /// Whether only a session operator may send this message.
    pub fn is_op_command(&self) -> bool {
        matches!(
            self.message_type(),
            MessageType::LayerAcl | MessageType::SessionTitle | MessageType::SessionConfig
        )
    }

    /// Payload length: the context id byte plus the body.
    pub fn payload_length(&self) -> usize {
        1 + self.body.body_len()
    }

    /// Full wire length, header included.
    pub fn length(&self) -> usize {
        HEADER_SIZE + self.payload_length()
    }

    /// Append the wire form to `dst` and return the number of bytes written.
    pub fn serialize(&self, dst: &mut BytesMut) -> Result<usize> {
        codec::encode_message(self, dst)?;
        Ok(self.length())
    }

    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut dst = BytesMut::with_capacity(self.length());
        self.serialize(&mut dst)?;
        Ok(dst.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{AnnotationRect, PenPoint};

    #[test]
    fn chat_lengths_count_context_and_flags() {
        let msg = Message::chat(3, "hi");
        assert_eq!(msg.payload_length(), 4);
        assert_eq!(msg.length(), 7);
        assert_eq!(msg.to_bytes().unwrap().len(), msg.length());
    }

    #[test]
    fn empty_bodies_are_context_only() {
        for msg in [
            Message::user_leave(2),
            Message::new(2, Body::PenUp),
            Message::undo_point(2),
        ] {
            assert_eq!(msg.payload_length(), 1, "{}", msg.message_type());
        }
    }

    #[test]
    fn undoable_is_every_command_but_undo() {
        assert!(Message::undo_point(1).is_undoable());
        assert!(Message::new(1, Body::PenUp).is_undoable());
        assert!(!Message::new(
            1,
            Undo {
                override_user: 0,
                points: 1
            }
        )
        .is_undoable());
        assert!(!Message::chat(1, "x").is_undoable());
        assert!(!Message::login(0, "x").is_undoable());
    }

    #[test]
    fn op_commands() {
        assert!(Message::new(
            1,
            SessionTitle {
                title: "t".into()
            }
        )
        .is_op_command());
        assert!(Message::new(
            1,
            LayerAcl {
                layer: 1,
                locked: false,
                exclusive: vec![]
            }
        )
        .is_op_command());
        assert!(!Message::chat(1, "x").is_op_command());
    }

    #[test]
    fn context_id_can_be_restamped() {
        let mut msg = Message::chat(0, "hello");
        msg.set_context_id(9);
        assert_eq!(msg.context_id(), 9);
        assert_eq!(msg.to_bytes().unwrap()[3], 9);
    }

    #[test]
    fn read_rejects_trailing_bytes_on_empty_bodies() {
        let err = Body::read(MessageType::PenUp, &[0]).unwrap_err();
        assert!(matches!(
            err,
            MessageError::InvalidPayload {
                message_type: MessageType::PenUp,
                ..
            }
        ));
    }

    #[test]
    fn stream_and_type_follow_body() {
        let stroke = Message::new(
            4,
            PenMove {
                points: vec![PenPoint {
                    x: 1,
                    y: 2,
                    pressure: 3,
                }],
            },
        );
        assert_eq!(stroke.message_type(), MessageType::PenMove);
        assert_eq!(stroke.stream(), Stream::Command);

        let note = Message::new(
            4,
            AnnotationReshape(AnnotationRect {
                id: 1,
                x: 0,
                y: 0,
                width: 1,
                height: 1,
            }),
        );
        assert_eq!(note.payload_length(), 15);
        assert_eq!(Message::user_join(1, "a").stream(), Stream::Meta);
        assert_eq!(Message::login(0, "a").stream(), Stream::Session);
    }
}

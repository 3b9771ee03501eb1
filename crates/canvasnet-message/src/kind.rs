use std::fmt;
use std::str::FromStr;

/// First type tag of the command stream.
pub const COMMAND_TAG_START: u8 = 128;

/// Protocol message types and their wire tags.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageType {
    Login = 0,

    UserJoin = 1,
    UserAttr = 2,
    UserLeave = 3,
    Chat = 4,
    LayerAcl = 5,
    Snapshot = 6,
    SessionTitle = 7,
    SessionConfig = 8,
    StreamPos = 9,

    CanvasResize = 128,
    LayerCreate = 129,
    LayerAttributes = 130,
    LayerRetitle = 131,
    LayerOrder = 132,
    LayerDelete = 133,
    PutImage = 134,
    ToolChange = 135,
    PenMove = 136,
    PenUp = 137,
    AnnotationCreate = 138,
    AnnotationReshape = 139,
    AnnotationEdit = 140,
    AnnotationDelete = 141,
    UndoPoint = 142,
    Undo = 143,
}

impl MessageType {
    /// Every defined type, in tag order.
    pub const ALL: [MessageType; 26] = [
        MessageType::Login,
        MessageType::UserJoin,
        MessageType::UserAttr,
        MessageType::UserLeave,
        MessageType::Chat,
        MessageType::LayerAcl,
        MessageType::Snapshot,
        MessageType::SessionTitle,
        MessageType::SessionConfig,
        MessageType::StreamPos,
        MessageType::CanvasResize,
        MessageType::LayerCreate,
        MessageType::LayerAttributes,
        MessageType::LayerRetitle,
        MessageType::LayerOrder,
        MessageType::LayerDelete,
        MessageType::PutImage,
        MessageType::ToolChange,
        MessageType::PenMove,
        MessageType::PenUp,
        MessageType::AnnotationCreate,
        MessageType::AnnotationReshape,
        MessageType::AnnotationEdit,
        MessageType::AnnotationDelete,
        MessageType::UndoPoint,
        MessageType::Undo,
    ];

    /// Look up a wire tag. Unassigned tags yield `None`.
    pub fn from_u8(tag: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| *kind as u8 == tag)
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn stream(self) -> Stream {
        Stream::of_tag(self as u8)
    }

    /// True for command-stream types (tag 128 and up).
    pub fn is_command(self) -> bool {
        self.stream() == Stream::Command
    }

    pub fn name(self) -> &'static str {
        match self {
            MessageType::Login => "login",
            MessageType::UserJoin => "user-join",
            MessageType::UserAttr => "user-attr",
            MessageType::UserLeave => "user-leave",
            MessageType::Chat => "chat",
            MessageType::LayerAcl => "layer-acl",
            MessageType::Snapshot => "snapshot",
            MessageType::SessionTitle => "session-title",
            MessageType::SessionConfig => "session-config",
            MessageType::StreamPos => "stream-pos",
            MessageType::CanvasResize => "canvas-resize",
            MessageType::LayerCreate => "layer-create",
            MessageType::LayerAttributes => "layer-attributes",
            MessageType::LayerRetitle => "layer-retitle",
            MessageType::LayerOrder => "layer-order",
            MessageType::LayerDelete => "layer-delete",
            MessageType::PutImage => "put-image",
            MessageType::ToolChange => "tool-change",
            MessageType::PenMove => "pen-move",
            MessageType::PenUp => "pen-up",
            MessageType::AnnotationCreate => "annotation-create",
            MessageType::AnnotationReshape => "annotation-reshape",
            MessageType::AnnotationEdit => "annotation-edit",
            MessageType::AnnotationDelete => "annotation-delete",
            MessageType::UndoPoint => "undo-point",
            MessageType::Undo => "undo",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for MessageType {
    type Error = crate::error::MessageError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Self::from_u8(tag).ok_or(crate::error::MessageError::UnknownType(tag))
    }
}

/// Which of the three logical streams a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    /// Session setup (the login handshake).
    Session,
    /// Session metadata: participants, chat, access control.
    Meta,
    /// Canvas-modifying commands.
    Command,
}

impl Stream {
    /// Classify a raw tag, assigned or not.
    pub fn of_tag(tag: u8) -> Self {
        match tag {
            0 => Stream::Session,
            t if t >= COMMAND_TAG_START => Stream::Command,
            _ => Stream::Meta,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stream::Session => "session",
            Stream::Meta => "meta",
            Stream::Command => "command",
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stream {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" => Ok(Stream::Session),
            "meta" => Ok(Stream::Meta),
            "command" | "commands" => Ok(Stream::Command),
            other => Err(format!(
                "unknown stream '{other}' (expected session, meta or command)"
            )),
        }
    }
}

//! Type-specific message bodies.
//!
//! A body is everything after the context id. All integers are big-endian.
//! Text is UTF-8 and always runs to the end of the payload, so it never needs
//! its own length prefix.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::kind::MessageType;

/// Reason a body failed validation.
pub type Invalid = &'static str;

/// Encoding and decoding of one message body.
pub trait Payload: Sized {
    const KIND: MessageType;

    /// Encoded body size in bytes.
    fn body_len(&self) -> usize;

    fn write_body(&self, dst: &mut BytesMut);

    /// Decode the body. Trailing bytes are checked by the caller.
    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid>;
}

/// Bounds-checked cursor over a message body.
#[derive(Debug)]
pub struct Fields<'a> {
    buf: &'a [u8],
}

impl<'a> Fields<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    fn need(&self, n: usize) -> std::result::Result<(), Invalid> {
        if self.buf.remaining() < n {
            Err("payload too short")
        } else {
            Ok(())
        }
    }

    pub fn u8(&mut self) -> std::result::Result<u8, Invalid> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn i8(&mut self) -> std::result::Result<i8, Invalid> {
        self.need(1)?;
        Ok(self.buf.get_i8())
    }

    pub fn u16(&mut self) -> std::result::Result<u16, Invalid> {
        self.need(2)?;
        Ok(self.buf.get_u16())
    }

    pub fn u32(&mut self) -> std::result::Result<u32, Invalid> {
        self.need(4)?;
        Ok(self.buf.get_u32())
    }

    pub fn i32(&mut self) -> std::result::Result<i32, Invalid> {
        self.need(4)?;
        Ok(self.buf.get_i32())
    }

    pub fn flag(&mut self) -> std::result::Result<bool, Invalid> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err("boolean field must be 0 or 1"),
        }
    }

    /// Take every remaining byte.
    pub fn rest(&mut self) -> &'a [u8] {
        std::mem::take(&mut self.buf)
    }

    /// Take every remaining byte as UTF-8 text.
    pub fn text(&mut self) -> std::result::Result<String, Invalid> {
        String::from_utf8(self.rest().to_vec()).map_err(|_| "text is not valid UTF-8")
    }

    pub fn finish(self) -> std::result::Result<(), Invalid> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err("unexpected trailing bytes")
        }
    }
}

/// Session handshake text (greeting or version string).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Login {
    pub message: String,
}

impl Payload for Login {
    const KIND: MessageType = MessageType::Login;

    fn body_len(&self) -> usize {
        self.message.len()
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_slice(self.message.as_bytes());
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        Ok(Self {
            message: src.text()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserJoin {
    pub name: String,
}

impl Payload for UserJoin {
    const KIND: MessageType = MessageType::UserJoin;

    fn body_len(&self) -> usize {
        self.name.len()
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_slice(self.name.as_bytes());
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        Ok(Self { name: src.text()? })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserAttr {
    pub attrs: u8,
}

impl UserAttr {
    pub const LOCKED: u8 = 0x01;
    pub const OPERATOR: u8 = 0x02;
}

impl Payload for UserAttr {
    const KIND: MessageType = MessageType::UserAttr;

    fn body_len(&self) -> usize {
        1
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_u8(self.attrs);
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        Ok(Self { attrs: src.u8()? })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub flags: u8,
    pub text: String,
}

impl Chat {
    /// Message from the server rather than a participant.
    pub const ANNOUNCEMENT: u8 = 0x01;
    /// Emote ("/me") style message.
    pub const ACTION: u8 = 0x02;
}

impl Payload for Chat {
    const KIND: MessageType = MessageType::Chat;

    fn body_len(&self) -> usize {
        1 + self.text.len()
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_u8(self.flags);
        dst.put_slice(self.text.as_bytes());
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        Ok(Self {
            flags: src.u8()?,
            text: src.text()?,
        })
    }
}

/// Layer access control: a lock flag plus the users allowed to draw on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerAcl {
    pub layer: u8,
    pub locked: bool,
    pub exclusive: Vec<u8>,
}

impl Payload for LayerAcl {
    const KIND: MessageType = MessageType::LayerAcl;

    fn body_len(&self) -> usize {
        2 + self.exclusive.len()
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_u8(self.layer);
        dst.put_u8(u8::from(self.locked));
        dst.put_slice(&self.exclusive);
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        Ok(Self {
            layer: src.u8()?,
            locked: src.flag()?,
            exclusive: src.rest().to_vec(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotMode {
    pub mode: u8,
}

impl SnapshotMode {
    pub const REQUEST: u8 = 0;
    pub const ACK: u8 = 1;
    pub const END: u8 = 2;
}

impl Payload for SnapshotMode {
    const KIND: MessageType = MessageType::Snapshot;

    fn body_len(&self) -> usize {
        1
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_u8(self.mode);
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        Ok(Self { mode: src.u8()? })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTitle {
    pub title: String,
}

impl Payload for SessionTitle {
    const KIND: MessageType = MessageType::SessionTitle;

    fn body_len(&self) -> usize {
        self.title.len()
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_slice(self.title.as_bytes());
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        Ok(Self { title: src.text()? })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub max_users: u8,
    pub flags: u16,
}

impl SessionConfig {
    pub const LOCKED: u16 = 0x0001;
    pub const LAYER_CONTROLS_LOCKED: u16 = 0x0002;
    pub const CLOSED: u16 = 0x0004;
}

impl Payload for SessionConfig {
    const KIND: MessageType = MessageType::SessionConfig;

    fn body_len(&self) -> usize {
        3
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_u8(self.max_users);
        dst.put_u16(self.flags);
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        Ok(Self {
            max_users: src.u8()?,
            flags: src.u16()?,
        })
    }
}

/// Byte offset into the session's command stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamPos {
    pub position: u32,
}

impl Payload for StreamPos {
    const KIND: MessageType = MessageType::StreamPos;

    fn body_len(&self) -> usize {
        4
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_u32(self.position);
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        Ok(Self {
            position: src.u32()?,
        })
    }
}

/// Grow (positive) or shrink (negative) each canvas edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasResize {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl Payload for CanvasResize {
    const KIND: MessageType = MessageType::CanvasResize;

    fn body_len(&self) -> usize {
        16
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_i32(self.top);
        dst.put_i32(self.right);
        dst.put_i32(self.bottom);
        dst.put_i32(self.left);
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        Ok(Self {
            top: src.i32()?,
            right: src.i32()?,
            bottom: src.i32()?,
            left: src.i32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerCreate {
    pub id: u8,
    /// ARGB fill colour.
    pub fill: u32,
    pub title: String,
}

impl Payload for LayerCreate {
    const KIND: MessageType = MessageType::LayerCreate;

    fn body_len(&self) -> usize {
        5 + self.title.len()
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_u8(self.id);
        dst.put_u32(self.fill);
        dst.put_slice(self.title.as_bytes());
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        Ok(Self {
            id: src.u8()?,
            fill: src.u32()?,
            title: src.text()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerAttributes {
    pub id: u8,
    pub opacity: u8,
    pub blend: u8,
}

impl Payload for LayerAttributes {
    const KIND: MessageType = MessageType::LayerAttributes;

    fn body_len(&self) -> usize {
        3
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_u8(self.id);
        dst.put_u8(self.opacity);
        dst.put_u8(self.blend);
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        Ok(Self {
            id: src.u8()?,
            opacity: src.u8()?,
            blend: src.u8()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRetitle {
    pub id: u8,
    pub title: String,
}

impl Payload for LayerRetitle {
    const KIND: MessageType = MessageType::LayerRetitle;

    fn body_len(&self) -> usize {
        1 + self.title.len()
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_u8(self.id);
        dst.put_slice(self.title.as_bytes());
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        Ok(Self {
            id: src.u8()?,
            title: src.text()?,
        })
    }
}

/// New bottom-to-top layer stacking order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerOrder {
    pub order: Vec<u8>,
}

impl Payload for LayerOrder {
    const KIND: MessageType = MessageType::LayerOrder;

    fn body_len(&self) -> usize {
        self.order.len()
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_slice(&self.order);
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        Ok(Self {
            order: src.rest().to_vec(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerDelete {
    pub id: u8,
    /// Merge the contents into the layer below before deleting.
    pub merge: bool,
}

impl Payload for LayerDelete {
    const KIND: MessageType = MessageType::LayerDelete;

    fn body_len(&self) -> usize {
        2
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_u8(self.id);
        dst.put_u8(u8::from(self.merge));
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        Ok(Self {
            id: src.u8()?,
            merge: src.flag()?,
        })
    }
}

/// Compressed image data pasted onto a layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutImage {
    pub layer: u8,
    pub flags: u8,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub image: Bytes,
}

impl PutImage {
    pub const BLEND: u8 = 0x01;
}

impl Payload for PutImage {
    const KIND: MessageType = MessageType::PutImage;

    fn body_len(&self) -> usize {
        10 + self.image.len()
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_u8(self.layer);
        dst.put_u8(self.flags);
        dst.put_u16(self.x);
        dst.put_u16(self.y);
        dst.put_u16(self.width);
        dst.put_u16(self.height);
        dst.put_slice(&self.image);
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        Ok(Self {
            layer: src.u8()?,
            flags: src.u8()?,
            x: src.u16()?,
            y: src.u16()?,
            width: src.u16()?,
            height: src.u16()?,
            image: Bytes::copy_from_slice(src.rest()),
        })
    }
}

/// Brush settings for the strokes that follow.
///
/// Hardness, size and opacity each carry a high and a low value; the brush
/// interpolates between them by pen pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolChange {
    pub layer: u8,
    pub blend: u8,
    pub mode: u8,
    pub spacing: u8,
    pub color_high: u32,
    pub color_low: u32,
    pub hardness_high: u8,
    pub hardness_low: u8,
    pub size_high: u8,
    pub size_low: u8,
    pub opacity_high: u8,
    pub opacity_low: u8,
}

impl Payload for ToolChange {
    const KIND: MessageType = MessageType::ToolChange;

    fn body_len(&self) -> usize {
        18
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_u8(self.layer);
        dst.put_u8(self.blend);
        dst.put_u8(self.mode);
        dst.put_u8(self.spacing);
        dst.put_u32(self.color_high);
        dst.put_u32(self.color_low);
        dst.put_u8(self.hardness_high);
        dst.put_u8(self.hardness_low);
        dst.put_u8(self.size_high);
        dst.put_u8(self.size_low);
        dst.put_u8(self.opacity_high);
        dst.put_u8(self.opacity_low);
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        Ok(Self {
            layer: src.u8()?,
            blend: src.u8()?,
            mode: src.u8()?,
            spacing: src.u8()?,
            color_high: src.u32()?,
            color_low: src.u32()?,
            hardness_high: src.u8()?,
            hardness_low: src.u8()?,
            size_high: src.u8()?,
            size_low: src.u8()?,
            opacity_high: src.u8()?,
            opacity_low: src.u8()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenPoint {
    pub x: i32,
    pub y: i32,
    pub pressure: u16,
}

impl PenPoint {
    pub const WIRE_SIZE: usize = 10;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PenMove {
    pub points: Vec<PenPoint>,
}

impl Payload for PenMove {
    const KIND: MessageType = MessageType::PenMove;

    fn body_len(&self) -> usize {
        self.points.len() * PenPoint::WIRE_SIZE
    }

    fn write_body(&self, dst: &mut BytesMut) {
        for point in &self.points {
            dst.put_i32(point.x);
            dst.put_i32(point.y);
            dst.put_u16(point.pressure);
        }
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        if src.remaining() == 0 {
            return Err("pen move needs at least one point");
        }
        if src.remaining() % PenPoint::WIRE_SIZE != 0 {
            return Err("pen move length is not a whole number of points");
        }
        let mut points = Vec::with_capacity(src.remaining() / PenPoint::WIRE_SIZE);
        while src.remaining() > 0 {
            points.push(PenPoint {
                x: src.i32()?,
                y: src.i32()?,
                pressure: src.u16()?,
            });
        }
        Ok(Self { points })
    }
}

/// Annotation rectangle, shared by create and reshape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationRect {
    pub id: u16,
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

impl AnnotationRect {
    fn write(&self, dst: &mut BytesMut) {
        dst.put_u16(self.id);
        dst.put_i32(self.x);
        dst.put_i32(self.y);
        dst.put_u16(self.width);
        dst.put_u16(self.height);
    }

    fn read(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        Ok(Self {
            id: src.u16()?,
            x: src.i32()?,
            y: src.i32()?,
            width: src.u16()?,
            height: src.u16()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationCreate(pub AnnotationRect);

impl Payload for AnnotationCreate {
    const KIND: MessageType = MessageType::AnnotationCreate;

    fn body_len(&self) -> usize {
        14
    }

    fn write_body(&self, dst: &mut BytesMut) {
        self.0.write(dst);
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        AnnotationRect::read(src).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationReshape(pub AnnotationRect);

impl Payload for AnnotationReshape {
    const KIND: MessageType = MessageType::AnnotationReshape;

    fn body_len(&self) -> usize {
        14
    }

    fn write_body(&self, dst: &mut BytesMut) {
        self.0.write(dst);
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        AnnotationRect::read(src).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationEdit {
    pub id: u16,
    /// ARGB background colour.
    pub background: u32,
    pub text: String,
}

impl Payload for AnnotationEdit {
    const KIND: MessageType = MessageType::AnnotationEdit;

    fn body_len(&self) -> usize {
        6 + self.text.len()
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_u16(self.id);
        dst.put_u32(self.background);
        dst.put_slice(self.text.as_bytes());
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        Ok(Self {
            id: src.u16()?,
            background: src.u32()?,
            text: src.text()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationDelete {
    pub id: u16,
}

impl Payload for AnnotationDelete {
    const KIND: MessageType = MessageType::AnnotationDelete;

    fn body_len(&self) -> usize {
        2
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_u16(self.id);
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        Ok(Self { id: src.u16()? })
    }
}

/// Undo (positive `points`) or redo (negative) a number of undo points.
///
/// A non-zero `override_user` lets an operator act on another participant's
/// history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Undo {
    pub override_user: u8,
    pub points: i8,
}

impl Payload for Undo {
    const KIND: MessageType = MessageType::Undo;

    fn body_len(&self) -> usize {
        2
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_u8(self.override_user);
        dst.put_i8(self.points);
    }

    fn read_body(src: &mut Fields<'_>) -> std::result::Result<Self, Invalid> {
        Ok(Self {
            override_user: src.u8()?,
            points: src.i8()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<P: Payload>(payload: &P) -> BytesMut {
        let mut dst = BytesMut::new();
        payload.write_body(&mut dst);
        assert_eq!(dst.len(), payload.body_len(), "{}", P::KIND);
        dst
    }

    #[test]
    fn fixed_layouts_have_declared_sizes() {
        let tool = ToolChange {
            layer: 1,
            blend: 2,
            mode: 3,
            spacing: 4,
            color_high: 0xFF00_00FF,
            color_low: 0xFF00_FF00,
            hardness_high: 5,
            hardness_low: 6,
            size_high: 7,
            size_low: 8,
            opacity_high: 9,
            opacity_low: 10,
        };
        let bytes = encode(&tool);
        assert_eq!(bytes.len(), 18);
        assert_eq!(&bytes[4..8], &[0xFF, 0x00, 0x00, 0xFF]);
        assert_eq!(&bytes[12..], &[5, 6, 7, 8, 9, 10]);

        let rect = AnnotationRect {
            id: 0x0102,
            x: -1,
            y: 2,
            width: 30,
            height: 40,
        };
        assert_eq!(encode(&AnnotationCreate(rect)).len(), 14);
        assert_eq!(
            encode(&CanvasResize {
                top: 1,
                right: 2,
                bottom: 3,
                left: 4
            })
            .len(),
            16
        );
    }

    #[test]
    fn pen_move_points_are_ten_bytes_each() {
        let stroke = PenMove {
            points: vec![
                PenPoint {
                    x: 10,
                    y: -20,
                    pressure: 0xFFFF,
                },
                PenPoint {
                    x: 11,
                    y: -21,
                    pressure: 0,
                },
            ],
        };
        let bytes = encode(&stroke);
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[4..8], &(-20i32).to_be_bytes());

        let mut fields = Fields::new(&bytes);
        assert_eq!(PenMove::read_body(&mut fields).unwrap(), stroke);
        fields.finish().unwrap();
    }

    #[test]
    fn pen_move_rejects_empty_and_ragged_bodies() {
        assert!(PenMove::read_body(&mut Fields::new(&[])).is_err());
        assert!(PenMove::read_body(&mut Fields::new(&[0u8; 15])).is_err());
    }

    #[test]
    fn short_body_is_rejected() {
        let err = CanvasResize::read_body(&mut Fields::new(&[0u8; 15])).unwrap_err();
        assert_eq!(err, "payload too short");
    }

    #[test]
    fn boolean_fields_reject_other_values() {
        let err = LayerDelete::read_body(&mut Fields::new(&[3, 2])).unwrap_err();
        assert_eq!(err, "boolean field must be 0 or 1");
    }

    #[test]
    fn text_must_be_utf8() {
        let err = SessionTitle::read_body(&mut Fields::new(&[0xFF, 0xFE])).unwrap_err();
        assert_eq!(err, "text is not valid UTF-8");
    }

    #[test]
    fn trailing_bytes_are_reported_by_finish() {
        let mut fields = Fields::new(&[1, 2, 3]);
        UserAttr::read_body(&mut fields).unwrap();
        assert_eq!(fields.finish().unwrap_err(), "unexpected trailing bytes");
    }

    #[test]
    fn layer_acl_keeps_exclusive_user_list() {
        let acl = LayerAcl {
            layer: 4,
            locked: true,
            exclusive: vec![2, 7, 9],
        };
        let bytes = encode(&acl);
        assert_eq!(bytes.as_ref(), &[4, 1, 2, 7, 9]);
        assert_eq!(LayerAcl::read_body(&mut Fields::new(&bytes)).unwrap(), acl);
    }
}

//! 2D affine transform and the bounded transform stack.

/// 2D affine transform.
///
/// `(ix, iy)` is the image of the x basis vector, `(jx, jy)` the image of the
/// y basis vector and `(tx, ty)` the translation:
///
/// ```text
/// x' = x·ix + y·jx + tx
/// y' = x·iy + y·jy + ty
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub ix: f32,
    pub iy: f32,
    pub jx: f32,
    pub jy: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    #[inline]
    pub const fn new(ix: f32, iy: f32, jx: f32, jy: f32, tx: f32, ty: f32) -> Self {
        Self { ix, iy, jx, jy, tx, ty }
    }

    #[inline]
    pub const fn translation(x: f32, y: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    #[inline]
    pub const fn scaling(x: f32, y: f32) -> Self {
        Self::new(x, 0.0, 0.0, y, 0.0, 0.0)
    }

    #[inline]
    pub fn rotation(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(c, -s, s, c, 0.0, 0.0)
    }

    /// Maps a point through this transform.
    #[inline]
    pub fn apply_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.ix + y * self.jx + self.tx,
            x * self.iy + y * self.jy + self.ty,
        )
    }

    /// Composes `t` into `self` so that `t` acts in the local frame of
    /// `self`: points go through `t` first, then through `self`.
    pub fn concat_local(&self, t: &Transform) -> Transform {
        let c = self;
        Transform {
            ix: t.ix * c.ix + t.iy * c.jx,
            iy: t.ix * c.iy + t.iy * c.jy,
            jx: t.jx * c.ix + t.jy * c.jx,
            jy: t.jx * c.iy + t.jy * c.jy,
            tx: t.tx * c.ix + t.ty * c.jx + c.tx,
            ty: t.tx * c.iy + t.ty * c.jy + c.ty,
        }
    }

    pub fn is_finite(&self) -> bool {
        [self.ix, self.iy, self.jx, self.jy, self.tx, self.ty]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Default maximum depth of a [`TransformStack`].
pub const MAX_TRANSFORM_STACK_DEPTH: usize = 256;

/// Current transform plus a bounded stack of saved transforms.
#[derive(Debug, Clone)]
pub struct TransformStack {
    current: Transform,
    saved: Vec<Transform>,
    max_depth: usize,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new(MAX_TRANSFORM_STACK_DEPTH)
    }
}

impl TransformStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            current: Transform::IDENTITY,
            saved: Vec::with_capacity(max_depth.min(MAX_TRANSFORM_STACK_DEPTH)),
            max_depth,
        }
    }

    #[inline]
    pub fn current(&self) -> &Transform {
        &self.current
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Saves the current transform.
    ///
    /// # Panics
    /// When the stack already holds `max_depth` entries. Unbalanced push/pop
    /// is a programming error.
    pub fn push(&mut self) {
        assert!(
            self.saved.len() < self.max_depth,
            "transform stack overflow (max depth {})",
            self.max_depth
        );
        self.saved.push(self.current);
    }

    /// Restores the last saved transform. No-op on an empty stack.
    pub fn pop(&mut self) {
        if let Some(t) = self.saved.pop() {
            self.current = t;
        }
    }

    /// Resets to identity and drops every saved entry.
    pub fn reset(&mut self) {
        self.current = Transform::IDENTITY;
        self.saved.clear();
    }

    /// Applies `t` in the current local frame, like canvas transforms.
    pub fn apply(&mut self, t: &Transform) {
        self.current = self.current.concat_local(t);
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.apply(&Transform::translation(x, y));
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.apply(&Transform::scaling(x, y));
    }

    pub fn rotate(&mut self, angle: f32) {
        self.apply(&Transform::rotation(angle));
    }
}

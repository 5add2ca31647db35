//! Offscreen render target bookkeeping.
//!
//! [`RenderTargetManager`] tracks sizes, generations and the currently bound
//! target; the actual GPU storage comes from a [`TargetAllocator`] so the
//! same bookkeeping drives wgpu textures and the recording allocator in tests.

use log::{debug, info};

use crate::{Result, WaterError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    ColorOnly,
    ColorAndDepth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    Color,
    Depth,
}

/// Something a shader can sample. Target handles go stale when their target
/// is reallocated; external handles are owned by whoever registered them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureHandle {
    Target {
        target: TargetId,
        attachment: Attachment,
        generation: u32,
    },
    External(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDescriptor {
    pub kind: TargetKind,
    pub width: u32,
    pub height: u32,
}

/// Backend that creates the storage behind a render target.
pub trait TargetAllocator {
    type Target;

    fn allocate(&mut self, label: &str, desc: &TargetDescriptor) -> Result<Self::Target>;
}

struct Slot<T> {
    label: String,
    desc: TargetDescriptor,
    generation: u32,
    target: T,
}

pub struct RenderTargetManager<A: TargetAllocator> {
    allocator: A,
    /// Indexed by id. Released targets leave a hole so ids are never reused.
    slots: Vec<Option<Slot<A::Target>>>,
    bound: Option<TargetId>,
}

impl<A: TargetAllocator> RenderTargetManager<A> {
    pub fn new(allocator: A) -> Self {
        Self {
            allocator,
            slots: Vec::new(),
            bound: None,
        }
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    pub fn allocator_mut(&mut self) -> &mut A {
        &mut self.allocator
    }

    pub fn acquire(&mut self, label: &str, kind: TargetKind, width: u32, height: u32) -> Result<TargetId> {
        let desc = TargetDescriptor { kind, width, height };
        let target = self.allocator.allocate(label, &desc)?;
        let id = TargetId(self.slots.len() as u32);
        info!("allocated render target '{label}' #{} {width}x{height} {kind:?}", id.0);
        self.slots.push(Some(Slot {
            label: label.to_owned(),
            desc,
            generation: 0,
            target,
        }));
        Ok(id)
    }

    /// Frees the storage behind `id`. Every handle taken from it stops
    /// resolving.
    pub fn release(&mut self, id: TargetId) -> Result<()> {
        if self.bound == Some(id) {
            return Err(WaterError::TargetAlreadyBound { bound: id.0 });
        }
        let slot = self
            .slots
            .get_mut(id.0 as usize)
            .and_then(Option::take)
            .ok_or(WaterError::UnknownTarget(id.0))?;
        info!("released render target '{}' #{}", slot.label, id.0);
        Ok(())
    }

    fn slot(&self, id: TargetId) -> Result<&Slot<A::Target>> {
        self.slots
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(WaterError::UnknownTarget(id.0))
    }

    /// Reallocates `id` at the new size. Returns `false` when the size is
    /// unchanged and nothing was done. Every handle previously taken from the
    /// target is invalidated.
    pub fn resize(&mut self, id: TargetId, width: u32, height: u32) -> Result<bool> {
        if self.bound == Some(id) {
            return Err(WaterError::TargetAlreadyBound { bound: id.0 });
        }
        let slot = self
            .slots
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(WaterError::UnknownTarget(id.0))?;
        if slot.desc.width == width && slot.desc.height == height {
            return Ok(false);
        }
        let desc = TargetDescriptor {
            width,
            height,
            ..slot.desc
        };
        slot.target = self.allocator.allocate(&slot.label, &desc)?;
        slot.desc = desc;
        slot.generation = slot.generation.wrapping_add(1);
        debug!(
            "resized render target '{}' #{} to {width}x{height} (generation {})",
            slot.label, id.0, slot.generation
        );
        Ok(true)
    }

    /// Makes `id` the destination of subsequent draws. Only one target can be
    /// bound at a time.
    pub fn bind(&mut self, id: TargetId) -> Result<()> {
        if let Some(bound) = self.bound {
            return Err(WaterError::TargetAlreadyBound { bound: bound.0 });
        }
        self.slot(id)?;
        self.bound = Some(id);
        Ok(())
    }

    /// Returns to the default framebuffer. Target contents are kept.
    pub fn unbind(&mut self) {
        self.bound = None;
    }

    /// `None` means the default framebuffer.
    pub fn bound(&self) -> Option<TargetId> {
        self.bound
    }

    pub fn get(&self, id: TargetId) -> Result<&A::Target> {
        self.slot(id).map(|slot| &slot.target)
    }

    pub fn descriptor(&self, id: TargetId) -> Result<TargetDescriptor> {
        self.slot(id).map(|slot| slot.desc)
    }

    /// Current handle to one attachment of `id`.
    pub fn texture(&self, id: TargetId, attachment: Attachment) -> Result<TextureHandle> {
        let slot = self.slot(id)?;
        if attachment == Attachment::Depth && slot.desc.kind == TargetKind::ColorOnly {
            return Err(WaterError::InvalidConfiguration(format!(
                "render target '{}' has no depth attachment",
                slot.label
            )));
        }
        Ok(TextureHandle::Target {
            target: id,
            attachment,
            generation: slot.generation,
        })
    }

    /// Looks up the target behind a handle, rejecting handles from before the
    /// last resize.
    pub fn resolve(&self, handle: TextureHandle) -> Result<Option<&A::Target>> {
        let TextureHandle::Target {
            target, generation, ..
        } = handle
        else {
            return Ok(None);
        };
        let slot = self.slot(target)?;
        if slot.generation != generation {
            return Err(WaterError::StaleTexture {
                target: target.0,
                held: generation,
                current: slot.generation,
            });
        }
        Ok(Some(&slot.target))
    }

    /// Number of live targets.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

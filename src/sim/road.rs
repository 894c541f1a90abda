//! Road streaming
//!
//! The road is a contiguous run of fixed-length segments keyed by integer
//! index (`index * segment_length` is the segment's center z). The car
//! travels toward -z, so segments "ahead" have lower indices. After every
//! update exactly the indices in `window(z)` are resident.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use glam::Vec3;

use crate::config::DrivingSettings;
use crate::platform::{BodyDesc, BodyHandle, Material, MeshDesc, MeshHandle, MeshKind, Scene, Shape};

const ROAD_COLOR: u32 = 0x2c2c54;
const BARRIER_COLOR: u32 = 0xffff00;
const MARKING_COLOR: u32 = 0xffffff;

/// Side barrier cross-section
const BARRIER_WIDTH: f32 = 2.0;
const BARRIER_HEIGHT: f32 = 4.0;
/// Road collision slab half thickness
const ROAD_HALF_THICKNESS: f32 = 0.1;

/// Dashed lane marking layout
const MARKING_WIDTH: f32 = 0.3;
const MARKING_LENGTH: f32 = 6.0;
const MARKING_SPACING: f32 = 10.0;
const MARKINGS_PER_LINE: u32 = 5;
/// Lift markings off the surface to avoid z-fighting
const MARKING_LIFT: f32 = 0.02;

/// One piece of segment geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Piece {
    pub kind: MeshKind,
    pub center: Vec3,
    pub size: Vec3,
    pub color: u32,
}

/// Everything a segment consists of, derived from its index alone
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentLayout {
    pub index: i64,
    pub surface: Piece,
    pub barriers: [Piece; 2],
    pub markings: Vec<Piece>,
}

impl SegmentLayout {
    pub fn for_index(index: i64, settings: &DrivingSettings) -> Self {
        let length = settings.road_segment_length;
        let width = settings.road_width;
        let z = index as f32 * length;

        let surface = Piece {
            kind: MeshKind::RoadSurface,
            center: Vec3::new(0.0, 0.0, z),
            size: Vec3::new(width, 0.0, length),
            color: ROAD_COLOR,
        };

        let barrier_x = width / 2.0 + BARRIER_WIDTH / 2.0;
        let barrier = |x: f32| Piece {
            kind: MeshKind::SideBarrier,
            center: Vec3::new(x, BARRIER_HEIGHT / 2.0, z),
            size: Vec3::new(BARRIER_WIDTH, BARRIER_HEIGHT, length),
            color: BARRIER_COLOR,
        };

        // Center line plus the two lane dividers
        let lines = [0.0, -width / 4.0, width / 4.0];
        let mut markings = Vec::with_capacity(lines.len() * MARKINGS_PER_LINE as usize);
        for x in lines {
            for i in 0..MARKINGS_PER_LINE {
                let dash_z = z - length / 2.0 + i as f32 * MARKING_SPACING + MARKING_SPACING / 2.0;
                markings.push(Piece {
                    kind: MeshKind::LaneMarking,
                    center: Vec3::new(x, MARKING_LIFT, dash_z),
                    size: Vec3::new(MARKING_WIDTH, 0.0, MARKING_LENGTH),
                    color: MARKING_COLOR,
                });
            }
        }

        Self {
            index,
            surface,
            barriers: [barrier(-barrier_x), barrier(barrier_x)],
            markings,
        }
    }
}

/// A resident segment and the resources it owns
#[derive(Debug, Clone)]
pub struct RoadSegment {
    pub index: i64,
    meshes: Vec<MeshHandle>,
    body: BodyHandle,
}

impl RoadSegment {
    /// Build all visual and collision resources for `index`
    fn build(index: i64, settings: &DrivingSettings, scene: &mut Scene) -> Self {
        let layout = SegmentLayout::for_index(index, settings);

        let mut meshes = Vec::with_capacity(1 + layout.barriers.len() + layout.markings.len());
        let pieces = std::iter::once(&layout.surface)
            .chain(layout.barriers.iter())
            .chain(layout.markings.iter());
        for piece in pieces {
            meshes.push(scene.renderer.create_mesh(MeshDesc {
                kind: piece.kind,
                size: piece.size,
                position: piece.center,
                color: piece.color,
            }));
        }

        let body = scene.physics.add_body(BodyDesc {
            shape: Shape::Cuboid {
                half_extents: Vec3::new(
                    settings.road_width / 2.0,
                    ROAD_HALF_THICKNESS,
                    settings.road_segment_length / 2.0,
                ),
            },
            mass: 0.0,
            material: Material::Road,
            position: layout.surface.center,
        });

        Self { index, meshes, body }
    }

    fn release(self, scene: &mut Scene) {
        for mesh in self.meshes {
            scene.renderer.destroy_mesh(mesh);
        }
        scene.physics.remove_body(self.body);
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }
}

/// Keeps the segment window resident around the car
#[derive(Debug, Clone)]
pub struct RoadStreamer {
    settings: DrivingSettings,
    segments: BTreeMap<i64, RoadSegment>,
}

impl RoadStreamer {
    pub fn new(settings: &DrivingSettings) -> Self {
        Self {
            settings: settings.clone(),
            segments: BTreeMap::new(),
        }
    }

    /// Index of the segment containing `z`
    pub fn segment_index(&self, z: f32) -> i64 {
        (z / self.settings.road_segment_length).floor() as i64
    }

    /// Indices that must be resident for a car at `z`
    pub fn window(&self, z: f32) -> RangeInclusive<i64> {
        let current = self.segment_index(z);
        (current - self.settings.segments_ahead as i64)..=(current + self.settings.segments_behind as i64)
    }

    /// Create missing segments, then evict those outside the window
    pub fn update(&mut self, z: f32, scene: &mut Scene) {
        let window = self.window(z);

        let mut created = 0;
        for index in window.clone() {
            if !self.segments.contains_key(&index) {
                let segment = RoadSegment::build(index, &self.settings, scene);
                self.segments.insert(index, segment);
                created += 1;
            }
        }

        let stale: Vec<i64> = self
            .segments
            .keys()
            .copied()
            .filter(|index| !window.contains(index))
            .collect();
        for index in &stale {
            if let Some(segment) = self.segments.remove(index) {
                segment.release(scene);
            }
        }

        if created > 0 || !stale.is_empty() {
            log::debug!(
                "Road window {:?}: +{} -{} segments",
                window,
                created,
                stale.len()
            );
        }
    }

    /// Release everything and rebuild the window around the spawn point
    pub fn reset(&mut self, scene: &mut Scene) {
        self.clear(scene);
        self.update(0.0, scene);
    }

    pub fn clear(&mut self, scene: &mut Scene) {
        for (_, segment) in std::mem::take(&mut self.segments) {
            segment.release(scene);
        }
    }

    pub fn resident_indices(&self) -> impl Iterator<Item = i64> + '_ {
        self.segments.keys().copied()
    }

    pub fn segment(&self, index: i64) -> Option<&RoadSegment> {
        self.segments.get(&index)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

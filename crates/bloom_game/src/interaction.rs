//! Containers placed by the layout generator, and the attack query that fills
//! them.

use glam::Vec2;

use crate::arena::{Arena, Handle};
use crate::controller::Facing;

#[derive(Debug, Clone)]
pub struct Container {
    /// Bottom-centre of the pot.
    pub position: Vec2,
    pub filled: bool,
}

pub type ContainerHandle = Handle<Container>;

/// A container filled by an attack, and where its growth should appear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub container: ContainerHandle,
    pub position: Vec2,
}

#[derive(Debug, Default)]
pub struct ContainerRegistry {
    containers: Arena<Container>,
}

impl ContainerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, position: Vec2) -> ContainerHandle {
        self.containers.insert(Container {
            position,
            filled: false,
        })
    }

    #[allow(dead_code)]
    pub fn get(&self, handle: ContainerHandle) -> Option<&Container> {
        self.containers.get(handle)
    }

    #[allow(dead_code)]
    pub fn iter(&self) -> impl Iterator<Item = (ContainerHandle, &Container)> {
        self.containers.iter()
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn filled_count(&self) -> usize {
        self.containers.iter().filter(|(_, c)| c.filled).count()
    }

    /// Fill every unfilled container within `range` (inclusive) on the side
    /// `facing` points to. A container directly above or below `origin` is
    /// on neither side.
    pub fn resolve_attack(&mut self, origin: Vec2, facing: Facing, range: f32) -> Vec<Fill> {
        let mut fills = Vec::new();
        for (handle, container) in self.containers.iter_mut() {
            if container.filled {
                continue;
            }
            let in_front = match facing {
                Facing::Left => container.position.x < origin.x,
                Facing::Right => container.position.x > origin.x,
            };
            if !in_front || origin.distance(container.position) > range {
                continue;
            }
            container.filled = true;
            fills.push(Fill {
                container: handle,
                position: container.position,
            });
        }

        log::debug!(
            "Attack at ({:.1}, {:.1}) facing {:?} filled {} container(s)",
            origin.x,
            origin.y,
            facing,
            fills.len()
        );
        fills
    }

    pub fn clear(&mut self) -> usize {
        self.containers.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(positions: &[Vec2]) -> (ContainerRegistry, Vec<ContainerHandle>) {
        let mut registry = ContainerRegistry::new();
        let handles = positions
            .iter()
            .map(|&p| registry.register(p))
            .collect();
        (registry, handles)
    }

    #[test]
    fn wrong_side_is_not_filled() {
        let (mut registry, handles) = registry_with(&[Vec2::new(150.0, 0.0)]);
        let fills = registry.resolve_attack(Vec2::new(100.0, 0.0), Facing::Left, 60.0);
        assert!(fills.is_empty());
        assert!(!registry.get(handles[0]).expect("container").filled);

        let fills = registry.resolve_attack(Vec2::new(100.0, 0.0), Facing::Right, 60.0);
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].container, handles[0]);
        assert_eq!(fills[0].position, Vec2::new(150.0, 0.0));
        assert!(registry.get(handles[0]).expect("container").filled);
    }

    #[test]
    fn range_boundary_is_inclusive() {
        let (mut registry, _) = registry_with(&[Vec2::new(160.0, 0.0)]);
        assert_eq!(
            registry
                .resolve_attack(Vec2::new(100.0, 0.0), Facing::Right, 60.0)
                .len(),
            1
        );

        let (mut registry, _) = registry_with(&[Vec2::new(160.01, 0.0)]);
        assert!(registry
            .resolve_attack(Vec2::new(100.0, 0.0), Facing::Right, 60.0)
            .is_empty());
    }

    #[test]
    fn distance_is_euclidean() {
        // 36 across and 48 down is exactly 60 away.
        let (mut registry, _) = registry_with(&[Vec2::new(136.0, 148.0)]);
        assert_eq!(
            registry
                .resolve_attack(Vec2::new(100.0, 100.0), Facing::Right, 60.0)
                .len(),
            1
        );

        let (mut registry, _) = registry_with(&[Vec2::new(140.0, 150.0)]);
        assert!(registry
            .resolve_attack(Vec2::new(100.0, 100.0), Facing::Right, 60.0)
            .is_empty());
    }

    #[test]
    fn one_attack_fills_every_qualifying_container() {
        let (mut registry, handles) = registry_with(&[
            Vec2::new(120.0, 0.0),
            Vec2::new(150.0, 0.0),
            Vec2::new(200.0, 0.0),
            Vec2::new(80.0, 0.0),
        ]);
        let fills = registry.resolve_attack(Vec2::new(100.0, 0.0), Facing::Right, 60.0);
        let filled: Vec<_> = fills.iter().map(|f| f.container).collect();
        assert_eq!(filled, vec![handles[0], handles[1]]);
        assert_eq!(registry.filled_count(), 2);
    }

    #[test]
    fn filled_container_is_never_filled_again() {
        let (mut registry, _) = registry_with(&[Vec2::new(130.0, 0.0)]);
        let origin = Vec2::new(100.0, 0.0);
        assert_eq!(registry.resolve_attack(origin, Facing::Right, 60.0).len(), 1);
        for _ in 0..5 {
            assert!(registry.resolve_attack(origin, Facing::Right, 60.0).is_empty());
        }
        assert_eq!(registry.filled_count(), 1);
    }

    #[test]
    fn container_level_with_the_attacker_is_on_neither_side() {
        let (mut registry, _) = registry_with(&[Vec2::new(100.0, 30.0)]);
        let origin = Vec2::new(100.0, 0.0);
        assert!(registry.resolve_attack(origin, Facing::Left, 60.0).is_empty());
        assert!(registry.resolve_attack(origin, Facing::Right, 60.0).is_empty());
    }
}

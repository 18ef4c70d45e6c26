//! Class-pair routing of raw engine callbacks.
//!
//! For every transition the table keeps two lists of ordered class pairs:
//! pairs whose ignore relation holds in either direction are serviced by
//! the sensor fixtures (their solid fixtures never touch), everything else
//! by the solid ones. A raw callback consults exactly one list — the
//! sensor list when both fixtures are sensors, the solid list when neither
//! is — so the solid/sensor fixture pairing never double-delivers.

use crate::core::classes::ClassRegistry;

/// The four event transitions routed by the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Enter,
    Exit,
    PreSolve,
    PostSolve,
}

#[derive(Debug, Default)]
struct PairList {
    sensor: Vec<(String, String)>,
    solid: Vec<(String, String)>,
}

impl PairList {
    fn clear(&mut self) {
        self.sensor.clear();
        self.solid.clear();
    }

    fn insert(&mut self, t1: &str, t2: &str, sensor: bool) {
        let list = if sensor {
            &mut self.sensor
        } else {
            &mut self.solid
        };
        let pair = (t1.to_string(), t2.to_string());
        if !list.contains(&pair) {
            list.push(pair);
        }
    }

    fn contains(&self, t1: &str, t2: &str, sensor: bool) -> bool {
        let list = if sensor { &self.sensor } else { &self.solid };
        list.iter().any(|(a, b)| a == t1 && b == t2)
    }
}

/// Routing table rebuilt whenever the class set (or the event mode)
/// changes.
#[derive(Debug, Default)]
pub(crate) struct RoutingTable {
    enter: PairList,
    exit: PairList,
    pre: PairList,
    post: PairList,
}

impl RoutingTable {
    fn list(&self, transition: Transition) -> &PairList {
        match transition {
            Transition::Enter => &self.enter,
            Transition::Exit => &self.exit,
            Transition::PreSolve => &self.pre,
            Transition::PostSolve => &self.post,
        }
    }

    fn list_mut(&mut self, transition: Transition) -> &mut PairList {
        match transition {
            Transition::Enter => &mut self.enter,
            Transition::Exit => &mut self.exit,
            Transition::PreSolve => &mut self.pre,
            Transition::PostSolve => &mut self.post,
        }
    }

    /// Rebuilds every list from the registry. Implicit mode seeds every
    /// ordered pair into all four transitions; explicit mode inserts only
    /// the peers each class declared.
    pub fn rebuild(&mut self, registry: &mut ClassRegistry, explicit: bool) {
        self.enter.clear();
        self.exit.clear();
        self.pre.clear();
        self.post.clear();

        let names: Vec<String> = registry.names().to_vec();
        if explicit {
            for name in &names {
                let def = registry
                    .def(name)
                    .expect("registry names resolve to definitions")
                    .clone();
                let declared = [
                    (Transition::Enter, def.enter),
                    (Transition::Exit, def.exit),
                    (Transition::PreSolve, def.pre),
                    (Transition::PostSolve, def.post),
                ];
                for (transition, peers) in declared {
                    for peer in &peers {
                        let sensor = registry.sensor_pair(name, peer);
                        self.list_mut(transition).insert(name, peer, sensor);
                    }
                }
            }
        } else {
            for t1 in &names {
                for t2 in &names {
                    let sensor = registry.sensor_pair(t1, t2);
                    for transition in [
                        Transition::Enter,
                        Transition::Exit,
                        Transition::PreSolve,
                        Transition::PostSolve,
                    ] {
                        self.list_mut(transition).insert(t1, t2, sensor);
                    }
                }
            }
        }
    }

    /// Whether a raw callback on classes `(t1, t2)` should enqueue an
    /// event on the `t1` collider, keyed by `t2`. Callers test both
    /// orientations, which delivers to both sides for symmetric seeds and
    /// realizes the self-pair mirror without double-delivery.
    pub fn should_fire(&self, transition: Transition, sensor: bool, t1: &str, t2: &str) -> bool {
        self.list(transition).contains(t1, t2, sensor)
    }
}

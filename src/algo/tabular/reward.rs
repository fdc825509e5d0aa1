use crate::{
    distance::Distance,
    encoding::{Symbol, HEALTH_LEVELS},
};

/// What the agent knows about a single step when it is rewarded for it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Symbol the action moved toward, read from the state it was taken in
    pub target: Symbol,
    /// Health bucket of the state the action was taken in
    pub health_bucket: u8,
    /// Distance from the hero's position after the step to the exit
    pub distance: Distance,
}

/// Reward for a single transition
///
/// Any `Fn(&Transition) -> f64` closure is a valid strategy.
pub trait TransitionReward {
    fn reward(&self, transition: &Transition) -> f64;
}

impl<F: Fn(&Transition) -> f64> TransitionReward for F {
    fn reward(&self, transition: &Transition) -> f64 {
        self(transition)
    }
}

/// Rewards the targeted tile, scaled by missing health for monsters and potions, minus a
/// penalty per step still separating the hero from the exit
///
/// A hurt hero is punished harder for walking into monsters and rewarded more for potions.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolReward {
    /// **Default**: `-1.0`
    pub empty: f64,
    /// **Default**: `-1.0`
    pub entrance: f64,
    /// **Default**: `1000.0`
    pub exit: f64,
    /// Multiplied by the number of missing health levels
    ///
    /// **Default**: `-20.0`
    pub monster: f64,
    /// **Default**: `35.0`
    pub treasure: f64,
    /// Multiplied by the number of missing health levels
    ///
    /// **Default**: `5.0`
    pub potion: f64,
    /// Bumping into a wall, the map edge, or the hero itself
    ///
    /// **Default**: `-10.0`
    pub blocked: f64,
    /// Per step to the exit
    ///
    /// **Default**: `-2.0`
    pub distance_weight: f64,
    /// Replaces the distance term when the hero stands where the exit cannot be reached from
    ///
    /// **Default**: `-200.0`
    pub unreachable: f64,
}

impl Default for SymbolReward {
    fn default() -> Self {
        Self {
            empty: -1.0,
            entrance: -1.0,
            exit: 1000.0,
            monster: -20.0,
            treasure: 35.0,
            potion: 5.0,
            blocked: -10.0,
            distance_weight: -2.0,
            unreachable: -200.0,
        }
    }
}

impl TransitionReward for SymbolReward {
    fn reward(&self, t: &Transition) -> f64 {
        let missing = HEALTH_LEVELS.saturating_sub(t.health_bucket) as f64;
        let tile = match t.target {
            Symbol::Empty => self.empty,
            Symbol::Entrance => self.entrance,
            Symbol::Exit => self.exit,
            Symbol::Monster => self.monster * missing,
            Symbol::Reward => self.treasure,
            Symbol::Potion => self.potion * missing,
            Symbol::Hero | Symbol::Wall | Symbol::OutOfBounds => self.blocked,
        };

        let distance = match t.distance {
            Distance::Steps(d) => self.distance_weight * d as f64,
            Distance::Wall | Distance::Unreachable => {
                log::warn!("rewarding a transition that ended out of reach of the exit");
                self.unreachable
            }
        };

        tile + distance
    }
}

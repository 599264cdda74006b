//! Two characters, one visible at a time; a click swaps them

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Character {
    Sarah,
    Spiderman,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterState {
    SarahVisible,
    SpidermanVisible,
}

impl CharacterState {
    pub fn swapped(self) -> Self {
        match self {
            CharacterState::SarahVisible => CharacterState::SpidermanVisible,
            CharacterState::SpidermanVisible => CharacterState::SarahVisible,
        }
    }

    pub fn shows(self, character: Character) -> bool {
        matches!(
            (self, character),
            (CharacterState::SarahVisible, Character::Sarah)
                | (CharacterState::SpidermanVisible, Character::Spiderman)
        )
    }
}

/// Visibility state machine for the two characters.
///
/// Inert until both characters are attached, in either order; then starts
/// in [`CharacterState::SarahVisible`]. A click swaps the state when the
/// pick hit anything or when the toggle is disarmed. Every swap re-arms the
/// toggle, so disarming buys exactly one unconditional swap.
#[derive(Debug, Clone)]
pub struct CharacterToggle {
    sarah_attached: bool,
    spiderman_attached: bool,
    state: Option<CharacterState>,
    armed: bool,
}

impl CharacterToggle {
    pub fn new(armed: bool) -> Self {
        Self {
            sarah_attached: false,
            spiderman_attached: false,
            state: None,
            armed,
        }
    }

    /// Records that a character's object is in the scene.
    ///
    /// Returns the initial state once the second character arrives.
    pub fn attach(&mut self, character: Character) -> Option<CharacterState> {
        match character {
            Character::Sarah => self.sarah_attached = true,
            Character::Spiderman => self.spiderman_attached = true,
        }
        if self.state.is_none() && self.sarah_attached && self.spiderman_attached {
            self.state = Some(CharacterState::SarahVisible);
            log::info!("both characters attached, toggle is live");
            return self.state;
        }
        None
    }

    pub fn state(&self) -> Option<CharacterState> {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn set_armed(&mut self, armed: bool) {
        self.armed = armed;
    }

    /// Whether `character` should be drawn. Before the toggle is live,
    /// Sarah shows as soon as she loads and Spiderman stays hidden.
    pub fn is_visible(&self, character: Character) -> bool {
        match self.state {
            Some(state) => state.shows(character),
            None => character == Character::Sarah,
        }
    }

    /// Handles a click whose pick did (`hit`) or did not hit anything.
    ///
    /// Returns the new state when the characters swapped.
    pub fn on_click(&mut self, hit: bool) -> Option<CharacterState> {
        let state = self.state?;
        if !hit && self.armed {
            return None;
        }
        let next = state.swapped();
        self.state = Some(next);
        self.armed = true;
        log::info!("swapped characters: {:?}", next);
        Some(next)
    }
}

impl Default for CharacterToggle {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live() -> CharacterToggle {
        let mut toggle = CharacterToggle::default();
        toggle.attach(Character::Sarah);
        toggle.attach(Character::Spiderman);
        toggle
    }

    #[test]
    fn inert_until_both_attached() {
        let mut toggle = CharacterToggle::default();
        assert_eq!(toggle.on_click(true), None);
        assert_eq!(toggle.attach(Character::Spiderman), None);
        assert_eq!(toggle.on_click(true), None);
        assert!(!toggle.is_visible(Character::Spiderman));

        assert_eq!(
            toggle.attach(Character::Sarah),
            Some(CharacterState::SarahVisible)
        );
        assert!(toggle.is_visible(Character::Sarah));
        assert!(!toggle.is_visible(Character::Spiderman));
    }

    #[test]
    fn hit_swaps() {
        let mut toggle = live();
        assert_eq!(toggle.on_click(true), Some(CharacterState::SpidermanVisible));
        assert!(toggle.is_visible(Character::Spiderman));
        assert!(!toggle.is_visible(Character::Sarah));
        assert_eq!(toggle.on_click(true), Some(CharacterState::SarahVisible));
    }

    #[test]
    fn armed_miss_does_nothing() {
        let mut toggle = live();
        assert_eq!(toggle.on_click(false), None);
        assert_eq!(toggle.state(), Some(CharacterState::SarahVisible));
    }

    #[test]
    fn disarmed_miss_swaps_once_and_rearms() {
        let mut toggle = live();
        toggle.set_armed(false);
        assert_eq!(toggle.on_click(false), Some(CharacterState::SpidermanVisible));
        assert!(toggle.is_armed());
        assert_eq!(toggle.on_click(false), None);
    }

    #[test]
    fn exactly_one_character_visible_once_live() {
        let mut toggle = live();
        for hit in [true, false, true, true] {
            toggle.on_click(hit);
            let shown = [Character::Sarah, Character::Spiderman]
                .iter()
                .filter(|c| toggle.is_visible(**c))
                .count();
            assert_eq!(shown, 1);
        }
    }

    #[test]
    fn second_attach_does_not_reset() {
        let mut toggle = live();
        toggle.on_click(true);
        assert_eq!(toggle.attach(Character::Sarah), None);
        assert_eq!(toggle.state(), Some(CharacterState::SpidermanVisible));
    }
}

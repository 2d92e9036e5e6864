//! Property tests for answer persistence across navigation.

use proctor_core::Session;
use proptest::prelude::*;

proptest! {
    /// An answer written to any slot survives navigating away and back.
    #[test]
    fn answer_survives_navigation(
        count in 1usize..12,
        raw_index in 0usize..12,
        text in ".{0,64}",
        detours in proptest::collection::vec(any::<bool>(), 0..24),
    ) {
        let index = raw_index % count;
        let questions = (0..count).map(|i| format!("q{i}")).collect();
        let mut session = Session::new("session-prop", questions).unwrap();

        while session.current_index() < index {
            session.next();
        }
        session.set_answer(index, text.clone()).unwrap();

        for forward in detours {
            if forward { session.next(); } else { session.previous(); }
        }
        while session.current_index() > index {
            session.previous();
        }
        while session.current_index() < index {
            session.next();
        }

        prop_assert_eq!(session.current_answer(), text.as_str());
        prop_assert_eq!(session.answers().len(), count);
    }

    /// Navigation never leaves `[0, len)`.
    #[test]
    fn navigation_stays_in_bounds(
        count in 1usize..8,
        moves in proptest::collection::vec(any::<bool>(), 0..64),
    ) {
        let questions = (0..count).map(|i| format!("q{i}")).collect();
        let mut session = Session::new("session-prop", questions).unwrap();
        for forward in moves {
            if forward { session.next(); } else { session.previous(); }
            prop_assert!(session.current_index() < count);
        }
    }
}

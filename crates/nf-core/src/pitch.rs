//! Key naming helpers

use crate::{Key, KEYS_PER_OCTAVE};

/// Pitch class of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitchClass {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

impl PitchClass {
    /// Split a key into pitch class and octave. Key 0 is C0.
    pub fn from_key(key: Key) -> (Self, i32) {
        let octave = key.div_euclid(KEYS_PER_OCTAVE);
        let class = match key.rem_euclid(KEYS_PER_OCTAVE) {
            0 => PitchClass::C,
            1 => PitchClass::Cs,
            2 => PitchClass::D,
            3 => PitchClass::Ds,
            4 => PitchClass::E,
            5 => PitchClass::F,
            6 => PitchClass::Fs,
            7 => PitchClass::G,
            8 => PitchClass::Gs,
            9 => PitchClass::A,
            10 => PitchClass::As,
            11 => PitchClass::B,
            _ => unreachable!(),
        };
        (class, octave)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }

    pub fn is_black(&self) -> bool {
        matches!(
            self,
            PitchClass::Cs | PitchClass::Ds | PitchClass::Fs | PitchClass::Gs | PitchClass::As
        )
    }
}

/// Display name for a key, e.g. `A4` for key 57
pub fn key_name(key: Key) -> String {
    let (class, octave) = PitchClass::from_key(key);
    format!("{}{}", class.name(), octave)
}

/// Is this key drawn as a black key?
pub fn is_black_key(key: Key) -> bool {
    PitchClass::from_key(key).0.is_black()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_name() {
        assert_eq!(key_name(0), "C0");
        assert_eq!(key_name(57), "A4");
        assert_eq!(key_name(61), "C#5");
    }

    #[test]
    fn test_black_keys() {
        let black: Vec<Key> = (48..60).filter(|&k| is_black_key(k)).collect();
        assert_eq!(black, vec![49, 51, 54, 56, 58]);
    }
}

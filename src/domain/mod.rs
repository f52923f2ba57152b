/*!
 * Domain Module
 *
 * Pure business logic: interval algebra (C1), calendar resolution (C2),
 * option generation (C3), and option-token signing (C4). Nothing in this
 * module touches the database or the clock directly — callers supply
 * pre-fetched rows and explicit timestamps, which keeps these functions
 * deterministic and cheap to test exhaustively.
 */

pub mod calendar;
pub mod intervals;
pub mod options;
pub mod token;

pub use calendar::free_intervals;
pub use intervals::{clip, contains, merge, overlaps, subtract, Interval};
pub use options::{generate_options, BarberChoice, BookingOption, OptionBlock, OptionGenerationError, OptionRequest};
pub use token::{decode as decode_option_token, encode as encode_option_token, DecodedOption, TokenError};

//! Exchange clients
//!
//! Transport and challenge solving sit behind the traits in `traits`, so
//! the YoBit clients can run against stubs.

pub mod errors;
pub mod traits;
pub mod types;
pub mod yobit;

pub use errors::{ChallengeError, TradeApiError, TradeApiResult, TransportError};
pub use traits::{ChallengeSolver, Transport};
pub use types::{join_pairs, CurrencyPair, FormPost, HttpResponse, Outcome, Params, TradeSide};
pub use yobit::{
    CommandChallengeSolver, PublicApiClient, ReqwestTransport, RequestSigner, SignedRequest,
    TradeApiClient, TradeApiClientBuilder,
};

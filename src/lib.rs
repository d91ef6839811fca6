#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg, doc_cfg_hide))]
#![cfg_attr(docsrs, doc(cfg_hide(docsrs, loom)))]
#![warn(missing_docs, missing_debug_implementations)]

#[macro_use]
pub(crate) mod util;

pub(crate) mod loom;

mod error;
pub mod queue;

#[doc(inline)]
pub use self::error::{EnqueueError, TryDequeueError};
#[doc(inline)]
pub use self::queue::FairQueue;

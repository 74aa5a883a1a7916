#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod error;
pub mod explanation;
pub mod results;
pub mod store;

pub mod io {
    pub use oxrdfio::{RdfFormat, RdfParser, RdfSerializer};
    pub use sparesults::QueryResultsFormat;
}

pub mod model {
    pub use rdf_cursor_model::*;
}

pub mod algebra {
    pub use rdf_cursor_algebra::*;
}

pub mod engine {
    pub use rdf_cursor_engine::*;
}

pub mod storage {
    pub use rdf_cursor_storage::*;
}

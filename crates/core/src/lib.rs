pub mod shared {
    pub mod artwork_kind;
    pub mod constants;
    pub mod error;
    pub mod frame;
    pub mod video_metadata;
}

pub mod pointer {
    pub mod domain {
        pub mod pointer_resolver;
    }
    pub mod infrastructure;
}

pub mod sampling {
    pub mod frame_sampler;
}

pub mod imaging {
    pub mod poster_crop;
}

pub mod video {
    pub mod domain {
        pub mod image_writer;
        pub mod video_decoder;
    }
    pub mod infrastructure;
}

pub mod artwork {
    pub mod artwork_store;
}

pub mod pipeline {
    pub mod batch_orchestrator;
    pub mod batch_report;
    pub mod generate_artwork_use_case;
    pub mod log_sink;
}

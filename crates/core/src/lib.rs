//! People counting over a live camera feed.
//!
//! The crate is split into small domain interfaces (capture, detection,
//! display, counting) with infrastructure adapters behind each one, and a
//! single use case in [`pipeline`] that drives them.

pub mod capture {
    pub mod domain {
        pub mod capture_request;
        pub mod frame_source;
    }
    pub mod infrastructure {
        pub mod ffmpeg_camera;
    }
}

pub mod counting {
    pub mod domain {
        pub mod clock;
        pub mod count_sink;
        pub mod detection_gate;
    }
    pub mod infrastructure {
        pub mod console_count_sink;
        pub mod file_count_sink;
    }
}

pub mod detection {
    pub mod domain {
        pub mod object_detector;
        pub mod person_counter;
    }
    pub mod infrastructure;
}

pub mod display {
    pub mod domain {
        pub mod frame_display;
    }
    pub mod infrastructure {
        pub mod highgui_display;
        pub mod null_display;
    }
}

pub mod pipeline {
    pub mod count_people_use_case;
    pub mod pipeline_logger;
}

pub mod shared {
    pub mod constants;
    pub mod detection;
    pub mod frame;
    pub mod stream_info;
}

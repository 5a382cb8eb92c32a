pub mod activity_category;
pub mod demo_itinerary;
pub mod export;
pub mod fallback;
pub mod guest_store;
pub mod image_service;
pub mod itinerary_generation_service;
pub mod llm_service;
pub mod package_service;
pub mod prompt_service;
pub mod recommendation_service;
pub mod session_service;
pub mod weather_service;

//! Configuration module

mod site;

pub use site::CmsConfig;
pub use site::PathPolicy;
pub use site::PathsConfig;
pub use site::SiteConfig;
pub use site::SocialConfig;

// Server configuration
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "5000";
pub const DEFAULT_DATA_PATH: &str = "data";
pub const DEFAULT_LOG_FILTER: &str = "learning_center_server=info,tower_http=info";

// Collections (one JSON file each under the data directory)
pub const TEACHERS_COLLECTION: &str = "teachers";
pub const STUDENTS_COLLECTION: &str = "students";
pub const GROUPS_COLLECTION: &str = "groups";
pub const PAYMENTS_COLLECTION: &str = "payments";
pub const TASKS_COLLECTION: &str = "tasks";
pub const COMPANIES_COLLECTION: &str = "companies";
pub const BRANCHES_COLLECTION: &str = "branches";

// Group defaults
pub const DEFAULT_GROUP_CAPACITY: u32 = 20;
pub const GROUP_STATUS_UPCOMING: &str = "upcoming";

// Payment defaults
pub const PAYMENT_TYPE_CASH: &str = "cash";
pub const PAYMENT_STATUS_PAID: &str = "paid";

// Company / branch defaults
pub const ORG_STATUS_ACTIVE: &str = "active";

// Task defaults
pub const TASK_STATUS_PENDING: &str = "pending";

// Join sentinels
pub const TEACHER_NOT_FOUND_SENTINEL: &str = "Teacher not found";
pub const UNKNOWN_SENTINEL: &str = "Unknown";

// Error messages
pub const ERR_STORAGE: &str = "Storage error";
pub const ERR_INTERNAL: &str = "Internal server error";
pub const ERR_ALREADY_MEMBER: &str = "Student is already in this group";
pub const ERR_GROUP_FULL: &str = "Group is full";
pub const ERR_ENDPOINT_NOT_FOUND: &str = "Endpoint not found";
pub const ERR_ENDPOINT_HINT: &str = "Please use one of the endpoints listed at /";

// Success messages
pub const MSG_STUDENT_ADDED: &str = "Student added to group";
pub const MSG_STUDENT_REMOVED: &str = "Student removed from group";

use crate::api::home::DepartmentStaffCount;
use crate::api::inform::{CreateInform, InformItem, InformListResponse, ReadInform};
use crate::api::leave_request::{CreateLeave, DecideLeave, LeaveFilter, LeaveListResponse};
use crate::api::staff::{ActivateStaff, CreateStaff, StaffFilter, StaffListResponse};
use crate::model::department::Department;
use crate::model::inform::Inform;
use crate::model::leave_request::LeaveRequest;
use crate::model::leave_type::LeaveType;
use crate::model::user::User;
use crate::models::{LoginReqDto, LoginResponse, ResetPwdReq};
use crate::utils::pagination::PageQuery;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "OA System API",
        version = "1.0.0",
        description = r#"
## Office Automation (OA) System

Backend of a small-office workflow system.

### Key Features
- **Leave approval**
  - Requests are routed to the requester's department leader, leaders' requests
    to the manager of their department, and the board leader's requests are
    approved on submission
  - Only the resolved approver may approve or reject, and only while pending
- **Notifications**
  - Public or department-targeted informs with read tracking
- **Staff**
  - Department leaders add staff, who activate their account from a mailed link
  - Staff lists export to xlsx; the board leader imports new staff from xlsx

### Security
Every endpoint except login, activation, media and health expects
`Authorization: JWT <token>` (or `Bearer <token>`).

### Response Format
- JSON bodies; errors are `{"code": "...", "message": "..."}`
- List endpoints accept `page` and `size`
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::reset_password,
        crate::auth::handlers::me,

        crate::api::leave_request::leave_types,
        crate::api::leave_request::responder,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::decide_leave,

        crate::api::inform::list_informs,
        crate::api::inform::create_inform,
        crate::api::inform::get_inform,
        crate::api::inform::delete_inform,
        crate::api::inform::read_inform,

        crate::api::staff::list_departments,
        crate::api::staff::list_staff,
        crate::api::staff::create_staff,
        crate::api::staff::update_staff,
        crate::api::staff::activation_page,
        crate::api::staff::activate_staff,
        crate::api::staff::download_staff,
        crate::api::staff::upload_staff,

        crate::api::image::upload_image,

        crate::api::home::latest_informs,
        crate::api::home::latest_leaves,
        crate::api::home::staff_count,
        crate::api::home::health
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            ResetPwdReq,
            User,
            Department,
            LeaveType,
            LeaveRequest,
            LeaveFilter,
            CreateLeave,
            DecideLeave,
            LeaveListResponse,
            Inform,
            InformItem,
            InformListResponse,
            CreateInform,
            ReadInform,
            PageQuery,
            StaffFilter,
            CreateStaff,
            ActivateStaff,
            StaffListResponse,
            DepartmentStaffCount
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and password APIs"),
        (name = "Leave", description = "Leave request and approval APIs"),
        (name = "Inform", description = "Notification APIs"),
        (name = "Staff", description = "Department and staff APIs"),
        (name = "Image", description = "Image upload APIs"),
        (name = "Home", description = "Dashboard APIs"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

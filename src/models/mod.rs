pub mod attendance;
pub mod course;
pub mod schedule;
pub mod timetable;
pub mod weekday;

pub use attendance::{
    AttendanceAction, AttendanceRecord, AttendanceUpdateResponse, MarkAttendanceRequest,
    UpdateAttendanceRequest,
};
pub use course::{Course, NewCourseRequest, UpdateCourseRequest};
pub use schedule::{NewScheduleRequest, NewSchedulesRequest, RecurringSlot};
pub use timetable::{ManualSlot, NewSlotRequest, SlotCategory, Timetable, UpdateSlotRequest};
pub use weekday::Weekday;

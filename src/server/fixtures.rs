//! Static data set served by the mock backend.

use crate::api::contract::*;

fn s(v: &str) -> String { v.to_string() }

pub fn classes() -> Vec<ClassInfo> {
    vec![
        ClassInfo {
            id: s("CLASS_001"), name: s("3º A"), subject: s("Matemática"),
            teacher_id: s("TEA001"), teacher_name: s("Prof. Roberto Lima"),
            students: 32, schedule: s("08:00 - 09:40"), room: s("Sala 101"),
        },
        ClassInfo {
            id: s("CLASS_002"), name: s("3º B"), subject: s("Matemática"),
            teacher_id: s("TEA001"), teacher_name: s("Prof. Roberto Lima"),
            students: 28, schedule: s("10:00 - 11:40"), room: s("Sala 102"),
        },
    ]
}

pub fn students() -> Vec<StudentInfo> {
    vec![
        StudentInfo {
            id: s("STU001"), name: s("Ana Silva Santos"), rm: s("123456"), call_number: 1,
            course: s("3º Ano A"), avatar: s("/avatars/student-1.png"), age: 17,
            observations: s("Aluna dedicada, participa ativamente das aulas."), biometric_enrolled: true,
        },
        StudentInfo {
            id: s("STU002"), name: s("Carlos Oliveira"), rm: s("123457"), call_number: 2,
            course: s("3º Ano A"), avatar: s("/avatars/student-2.png"), age: 17,
            observations: s("Bom desempenho em exatas."), biometric_enrolled: true,
        },
        StudentInfo {
            id: s("STU003"), name: s("Maria Fernandes"), rm: s("123458"), call_number: 3,
            course: s("3º Ano A"), avatar: s("/avatars/student-3.png"), age: 18,
            observations: String::new(), biometric_enrolled: false,
        },
    ]
}

pub fn grades() -> Vec<GradeRecord> {
    vec![
        GradeRecord {
            id: s("GRD_001"), student_id: s("STU001"), student_name: s("Ana Silva Santos"), subject: s("Matemática"),
            bimester1: Some(9.2), bimester2: Some(8.7), bimester3: Some(9.0), bimester4: None,
            average: 8.97, status: GradeStatus::Excellent,
        },
        GradeRecord {
            id: s("GRD_002"), student_id: s("STU001"), student_name: s("Ana Silva Santos"), subject: s("Português"),
            bimester1: Some(8.5), bimester2: Some(8.0), bimester3: Some(8.8), bimester4: None,
            average: 8.43, status: GradeStatus::Good,
        },
    ]
}

pub fn attendance() -> Vec<AttendanceRecord> {
    vec![
        AttendanceRecord {
            id: s("ATT_001"), student_id: s("STU001"), date: s("2024-01-15"), class_id: s("CLASS_001"),
            subject: s("Matemática"), status: AttendanceStatus::Present,
            verified_by: Some(s("biometric")), justification: None,
        },
        AttendanceRecord {
            id: s("ATT_002"), student_id: s("STU001"), date: s("2024-01-16"), class_id: s("CLASS_001"),
            subject: s("Matemática"), status: AttendanceStatus::Absent,
            verified_by: None, justification: Some(String::new()),
        },
    ]
}

pub fn activities() -> Vec<Activity> {
    vec![
        Activity {
            id: s("ACT_001"), title: s("Trabalho de Geometria Analítica"), subject: s("Matemática"),
            description: s("Resolver exercícios do capítulo 5"), due_date: s("2024-01-25"),
            status: ActivityStatus::Pending, submitted_date: None, weight: 2.0, grade: None, max_grade: 10.0,
        },
        Activity {
            id: s("ACT_002"), title: s("Redação sobre Modernismo"), subject: s("Português"),
            description: s("Análise de obra modernista"), due_date: s("2024-01-20"),
            status: ActivityStatus::Submitted, submitted_date: Some(s("2024-01-18")), weight: 1.5,
            grade: Some(8.5), max_grade: 10.0,
        },
    ]
}

pub fn materials() -> Vec<Material> {
    vec![
        Material {
            id: s("MAT_001"), title: s("Apostila de Geometria Analítica"), subject: s("Matemática"), kind: s("pdf"),
            url: s("/materials/geometria-analitica.pdf"), uploaded_at: s("2024-01-10"), uploaded_by: s("Prof. Roberto Lima"),
        },
        Material {
            id: s("MAT_002"), title: s("Slides - Funções Quadráticas"), subject: s("Matemática"), kind: s("pptx"),
            url: s("/materials/funcoes-quadraticas.pptx"), uploaded_at: s("2024-01-12"), uploaded_by: s("Prof. Roberto Lima"),
        },
    ]
}

fn slot(time: &str, subject: &str, teacher: &str, room: &str) -> ScheduleSlot {
    ScheduleSlot { time: s(time), subject: s(subject), teacher: s(teacher), room: s(room) }
}

pub fn schedule() -> Vec<ScheduleDay> {
    vec![
        ScheduleDay {
            day: s("Segunda-feira"),
            classes: vec![
                slot("07:30 - 08:20", "Matemática", "Prof. Roberto", "101"),
                slot("08:20 - 09:10", "Português", "Prof. Ana", "203"),
                slot("09:30 - 10:20", "História", "Prof. Carlos", "105"),
                slot("10:20 - 11:10", "Física", "Prof. Maria", "301"),
            ],
        },
        ScheduleDay {
            day: s("Terça-feira"),
            classes: vec![
                slot("07:30 - 08:20", "Química", "Prof. João", "302"),
                slot("08:20 - 09:10", "Biologia", "Prof. Paula", "303"),
                slot("09:30 - 10:20", "Geografia", "Prof. Pedro", "106"),
                slot("10:20 - 11:10", "Inglês", "Prof. Laura", "204"),
            ],
        },
    ]
}

/// Display names handed out by mock login, per role.
pub fn names_for(role: crate::identity::Role) -> &'static [&'static str] {
    use crate::identity::Role;
    match role {
        Role::Student => &["Ana Silva", "Carlos Santos", "Maria Oliveira", "João Ferreira"],
        Role::Teacher => &["Prof. Roberto Lima", "Prof. Patricia Costa", "Prof. Daniel Rocha"],
        Role::Coordinator => &["Coordenador Silva", "Coordenadora Mendes"],
        Role::Secretary => &["Secretário Oliveira", "Secretária Almeida"],
        Role::Director => &["Diretora Santos", "Diretor Carvalho"],
        Role::Developer => &["Dev Master", "System Admin", "Tech Lead"],
    }
}

pub const COURSES: &[&str] = &[
    "1º Ano - Ensino Médio",
    "2º Ano - Ensino Médio",
    "3º Ano - Ensino Médio",
];

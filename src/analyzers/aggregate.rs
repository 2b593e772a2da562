use crate::analyzers::types::{GroupStat, Task, TaskResult};
use crate::clean::Grade;
use crate::parser::SurveyRecord;
use std::collections::BTreeMap;

/// Counts passes over a sequence of per-record flags.
pub fn tally(passes: &[bool]) -> GroupStat {
    let count = passes.iter().filter(|p| **p).count();
    GroupStat::new(count, passes.len())
}

/// Counts passes per group. Records whose key is `None` are left out of every
/// group (but still count in the overall tally).
pub fn tally_by<K, F>(records: &[SurveyRecord], passes: &[bool], key: F) -> BTreeMap<K, GroupStat>
where
    K: Ord,
    F: Fn(&SurveyRecord) -> Option<K>,
{
    let mut groups: BTreeMap<K, (usize, usize)> = BTreeMap::new();

    for (record, passed) in records.iter().zip(passes) {
        let Some(k) = key(record) else {
            continue;
        };
        let entry = groups.entry(k).or_default();
        entry.1 += 1;
        if *passed {
            entry.0 += 1;
        }
    }

    groups
        .into_iter()
        .map(|(k, (count, total))| (k, GroupStat::new(count, total)))
        .collect()
}

pub(crate) fn gender_key(record: &SurveyRecord) -> Option<String> {
    (!record.gender.is_empty()).then(|| record.gender.clone())
}

pub(crate) fn grade_key(record: &SurveyRecord) -> Option<Grade> {
    (!record.grade.as_str().is_empty()).then(|| record.grade.clone())
}

/// Rolls one task's per-record flags up overall and by gender, age and grade.
///
/// `passes` is parallel to `records`.
pub fn task_result(task: Task, records: &[SurveyRecord], passes: &[bool]) -> TaskResult {
    debug_assert_eq!(records.len(), passes.len());

    TaskResult {
        task,
        overall: tally(passes),
        by_gender: tally_by(records, passes, gender_key),
        by_age: tally_by(records, passes, |r| Some(r.age)),
        by_grade: tally_by(records, passes, grade_key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<SurveyRecord> {
        vec![
            SurveyRecord::new("A", "2", "Female", 7),
            SurveyRecord::new("A", "2", "Male", 7),
            SurveyRecord::new("A", "3", "Female", 8),
            SurveyRecord::new("B", "", "", 9),
        ]
    }

    #[test]
    fn test_tally() {
        let stat = tally(&[true, false, true, false]);
        assert_eq!(stat.count, 2);
        assert_eq!(stat.total, 4);
        assert_eq!(stat.percentage, 50.0);
    }

    #[test]
    fn test_task_result_groups() {
        let records = records();
        let passes = [true, false, true, true];
        let result = task_result(Task::Addition, &records, &passes);

        assert_eq!(result.overall, GroupStat::new(3, 4));
        assert_eq!(result.by_gender["Female"], GroupStat::new(2, 2));
        assert_eq!(result.by_gender["Male"], GroupStat::new(0, 1));
        assert_eq!(result.by_gender.len(), 2);
        assert_eq!(result.by_age[&7], GroupStat::new(1, 2));
        assert_eq!(result.by_age[&9], GroupStat::new(1, 1));
        assert_eq!(result.by_grade[&Grade::new("3")], GroupStat::new(1, 1));
        assert!(!result.by_grade.contains_key(&Grade::new("")));
    }
}
